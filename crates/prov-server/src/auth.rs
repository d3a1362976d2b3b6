use std::collections::BTreeMap;

use async_trait::async_trait;
use axum::http::{header, HeaderMap};

use crate::error::{ServerError, ServerResult};

/// The resolved caller, recorded as `createdByWallet`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub wallet: String,
}

impl Identity {
    pub fn anonymous() -> Self {
        Self {
            wallet: prov_core::context::ANONYMOUS_PRINCIPAL.into(),
        }
    }

    pub fn wallet(wallet: impl Into<String>) -> Self {
        Self {
            wallet: wallet.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Anonymous,
}

impl Credentials {
    /// Read `Authorization: Bearer <token>`; anything else is anonymous.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| Self::Bearer(t.to_string()))
            .unwrap_or(Self::Anonymous)
    }
}

/// Resolves request credentials to a wallet identity.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity>;
}

/// Accepts everyone; every caller is the anonymous wallet.
pub struct AllowAllAuth;

#[async_trait]
impl AuthProvider for AllowAllAuth {
    async fn authenticate(&self, _credentials: &Credentials) -> ServerResult<Identity> {
        Ok(Identity::anonymous())
    }
}

/// Fixed table of bearer tokens, each bound to one wallet.
pub struct StaticTokenAuth {
    tokens: BTreeMap<String, String>,
}

impl StaticTokenAuth {
    pub fn new(tokens: BTreeMap<String, String>) -> Self {
        Self { tokens }
    }
}

#[async_trait]
impl AuthProvider for StaticTokenAuth {
    async fn authenticate(&self, credentials: &Credentials) -> ServerResult<Identity> {
        match credentials {
            Credentials::Bearer(token) => self
                .tokens
                .get(token)
                .map(Identity::wallet)
                .ok_or_else(|| ServerError::AuthFailed("unknown token".into())),
            Credentials::Anonymous => Err(ServerError::AuthFailed("bearer token required".into())),
        }
    }
}
