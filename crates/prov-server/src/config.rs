use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server configuration, usually loaded from a TOML file.
///
/// ```toml
/// bind_addr = "0.0.0.0:8088"
/// data_dir = "/var/lib/prov"
///
/// [ledger]
/// endpoint = "https://gateway.example.com/api/"
/// timeout_ms = 5000
///
/// [auth_tokens]
/// "s3cret" = "0x9f2c...wallet"
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Directory holding the product journal.
    pub data_dir: PathBuf,
    pub ledger: LedgerConfig,
    /// Bearer token to wallet. Empty means anonymous access.
    pub auth_tokens: BTreeMap<String, String>,
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8088)),
            data_dir: PathBuf::from("./data"),
            ledger: LedgerConfig::default(),
            auth_tokens: BTreeMap::new(),
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn load(path: &Path) -> ServerResult<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }
}

/// Which ledger to anchor against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Gateway base URL. `None` runs against the in-process simulated chain.
    pub endpoint: Option<String>,
    /// Bound on every ledger call.
    pub timeout_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_ms: 10_000,
        }
    }
}

impl LedgerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
