use std::sync::Arc;

use axum::http::HeaderMap;
use prov_core::{Coordinator, OpContext};

use crate::auth::{AllowAllAuth, AuthProvider, Credentials, Identity};
use crate::error::ServerResult;
use crate::qr::{NoQrRenderer, QrRenderer};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: Arc<Coordinator>,
    pub auth: Arc<dyn AuthProvider>,
    pub qr: Arc<dyn QrRenderer>,
}

impl AppState {
    /// State with open access and no QR rendering.
    pub fn new(coordinator: Arc<Coordinator>) -> Self {
        Self {
            coordinator,
            auth: Arc::new(AllowAllAuth),
            qr: Arc::new(NoQrRenderer),
        }
    }

    pub fn with_auth(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = auth;
        self
    }

    pub fn with_qr(mut self, qr: Arc<dyn QrRenderer>) -> Self {
        self.qr = qr;
        self
    }

    /// Authenticate the caller and open an operation context in the
    /// current request span.
    pub async fn authenticated(&self, headers: &HeaderMap) -> ServerResult<OpContext> {
        let identity = self
            .auth
            .authenticate(&Credentials::from_headers(headers))
            .await?;
        Ok(OpContext::with_span(identity.wallet, tracing::Span::current()))
    }

    /// Context for public reads.
    pub fn public(&self) -> OpContext {
        OpContext::with_span(Identity::anonymous().wallet, tracing::Span::current())
    }
}
