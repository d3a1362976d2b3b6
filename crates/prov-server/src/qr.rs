use async_trait::async_trait;
use prov_types::ProductId;

use crate::error::ServerResult;

/// Renders a scannable code for a newly created product.
///
/// Failures are logged by the caller and never abort the create.
#[async_trait]
pub trait QrRenderer: Send + Sync {
    /// Image payload (for example a data URL), or `None` if nothing was rendered.
    async fn render(&self, product_id: &ProductId) -> ServerResult<Option<String>>;
}

/// Renders nothing.
pub struct NoQrRenderer;

#[async_trait]
impl QrRenderer for NoQrRenderer {
    async fn render(&self, _product_id: &ProductId) -> ServerResult<Option<String>> {
        Ok(None)
    }
}
