use std::sync::Arc;

use prov_core::{Coordinator, CoordinatorConfig};
use prov_ledger::{HttpLedgerClient, InMemoryLedger, LedgerClient};
use prov_store::{FileProvenanceStore, SyncMode};
use tokio::net::TcpListener;

use crate::auth::{AllowAllAuth, AuthProvider, StaticTokenAuth};
use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::router::build_router;
use crate::state::AppState;

/// Provenance ledger HTTP server.
pub struct ProvServer {
    config: ServerConfig,
}

impl ProvServer {
    pub fn new(config: ServerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Open the journal and connect the configured ledger.
    pub fn coordinator(&self) -> ServerResult<Coordinator> {
        let ledger: Arc<dyn LedgerClient> = match &self.config.ledger.endpoint {
            Some(endpoint) => {
                tracing::info!(%endpoint, "anchoring through ledger gateway");
                Arc::new(HttpLedgerClient::new(endpoint, self.config.ledger.timeout())?)
            }
            None => {
                tracing::warn!("no ledger endpoint configured; using the simulated chain");
                Arc::new(InMemoryLedger::default())
            }
        };
        let store = FileProvenanceStore::open_in(&self.config.data_dir, SyncMode::EveryWrite)?;
        tracing::info!(journal = %store.path().display(), "product journal opened");

        Ok(Coordinator::new(
            ledger,
            Arc::new(store),
            CoordinatorConfig::default().with_ledger_timeout(self.config.ledger.timeout()),
        ))
    }

    /// Full handler state for this configuration.
    pub fn state(&self) -> ServerResult<AppState> {
        let auth: Arc<dyn AuthProvider> = if self.config.auth_tokens.is_empty() {
            Arc::new(AllowAllAuth)
        } else {
            Arc::new(StaticTokenAuth::new(self.config.auth_tokens.clone()))
        };
        Ok(AppState::new(Arc::new(self.coordinator()?)).with_auth(auth))
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> ServerResult<axum::Router> {
        Ok(build_router(self.state()?, self.config.max_body_bytes))
    }

    /// Start serving requests.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router()?;
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!("provenance server listening on {}", self.config.bind_addr);
        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::Internal(e.to_string()))
    }
}
