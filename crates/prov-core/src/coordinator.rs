use std::future::Future;
use std::sync::Arc;

use prov_crypto::ContentHasher;
use prov_ledger::{LedgerClient, LedgerError, LedgerResult, RecordFields, ValueNormalizer};
use prov_store::ProvenanceStore;
use prov_types::{
    placeholder_ref, Anchoring, Product, ProductId, ProductInput, StageLabel, TypeError,
};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::CoordinatorConfig;
use crate::context::OpContext;
use crate::error::{CoreError, CoreResult};
use crate::outcome::{CreateOutcome, ReadOutcome, StageOutcome};

/// Orchestrates dual writes and merged reads over the local store and the
/// external ledger.
///
/// Every write is attempted on the ledger first, bounded by
/// [`CoordinatorConfig::ledger_timeout`], and then persisted locally. The
/// local write is the commit point: once it returns, dropping the
/// operation's future cannot undo it.
pub struct Coordinator {
    ledger: Arc<dyn LedgerClient>,
    store: Arc<dyn ProvenanceStore>,
    normalizer: ValueNormalizer,
    config: CoordinatorConfig,
}

impl Coordinator {
    pub fn new(
        ledger: Arc<dyn LedgerClient>,
        store: Arc<dyn ProvenanceStore>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            ledger,
            store,
            normalizer: ValueNormalizer::default(),
            config,
        }
    }

    pub fn with_normalizer(mut self, normalizer: ValueNormalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn ProvenanceStore> {
        &self.store
    }

    // ---- Writes ----

    /// Create a product, anchoring it on the ledger if possible.
    ///
    /// With certificate content, `certificationHash` is its digest;
    /// otherwise the caller-supplied `blockchainRefHash` (or empty). When
    /// the ledger call fails the stored reference falls back to the
    /// caller-supplied value, else to a fresh placeholder.
    pub async fn create_product(
        &self,
        ctx: &OpContext,
        input: ProductInput,
        certificate: Option<&[u8]>,
    ) -> CoreResult<CreateOutcome> {
        let id = input.validate()?;
        if self.store.find_by_id(&id)?.is_some() {
            return Err(CoreError::Duplicate(id));
        }

        let certification_hash = match certificate.filter(|c| !c.is_empty()) {
            Some(content) => ContentHasher::CERTIFICATE.digest(content),
            None => input.supplied_ref().unwrap_or_default().to_string(),
        };

        let fields = RecordFields {
            product_id: id.to_string(),
            name: input.name.clone(),
            origin: input.origin.clone(),
            manufacturer: input.manufacturer.clone(),
            certification_hash: certification_hash.clone(),
        };
        let anchoring = self
            .anchor(
                ctx,
                &id,
                "create_record",
                self.ledger.create_record(&id, &fields),
            )
            .await;

        let transaction_ref = match &anchoring {
            Anchoring::Anchored { tx_ref } => tx_ref.clone(),
            Anchoring::Unanchored { .. } => match input.supplied_ref() {
                Some(supplied) => supplied.to_string(),
                None => placeholder_ref(),
            },
        };

        let product = Product::new(
            id,
            input,
            certification_hash,
            transaction_ref.clone(),
            ctx.principal.clone(),
        );
        self.store.create(&product).map_err(|e| {
            error!(parent: &ctx.span, product_id = %product.product_id(), error = %e, "product not persisted");
            CoreError::from(e)
        })?;

        info!(
            parent: &ctx.span,
            product_id = %product.product_id(),
            anchored = anchoring.is_anchored(),
            reference = %transaction_ref,
            "product created"
        );
        Ok(CreateOutcome {
            product,
            anchoring,
            transaction_ref,
        })
    }

    /// Append a custody-chain stage.
    ///
    /// The stage is always persisted locally. The stored ledger reference
    /// only moves forward when this append was anchored; a failed ledger
    /// call leaves the previous reference in place. Stage and reference go
    /// to the store as one write, so a storage error leaves neither behind.
    pub async fn append_stage(
        &self,
        ctx: &OpContext,
        product_id: &str,
        stage: &str,
    ) -> CoreResult<StageOutcome> {
        let id = ProductId::new(product_id)?;
        let stage = StageLabel::new(stage)?;
        if self.store.find_by_id(&id)?.is_none() {
            return Err(CoreError::NotFound(format!("product {id}")));
        }

        let anchoring = self
            .anchor(ctx, &id, "append_stage", self.ledger.append_stage(&id, &stage))
            .await;

        let product = self
            .store
            .append_stage(&id, &stage, anchoring.tx_ref())
            .map_err(|e| {
                error!(parent: &ctx.span, product_id = %id, stage = %stage, error = %e, "stage not persisted");
                CoreError::from(e)
            })?;

        info!(
            parent: &ctx.span,
            product_id = %id,
            stage = %stage,
            stages = product.stages().len(),
            anchored = anchoring.is_anchored(),
            "stage appended"
        );
        Ok(StageOutcome { product, anchoring })
    }

    // ---- Reads ----

    /// Local record plus the best-effort on-chain view.
    pub async fn read_product(&self, ctx: &OpContext, product_id: &str) -> CoreResult<ReadOutcome> {
        let id = ProductId::new(product_id)?;
        let product = self
            .store
            .find_by_id(&id)?
            .ok_or_else(|| CoreError::NotFound(format!("product {id}")))?;
        Ok(self.merge(ctx, product).await)
    }

    /// Look a product up by certification hash, falling back to its ledger
    /// reference for records that predate certification hashing.
    pub async fn read_by_certification_hash(
        &self,
        ctx: &OpContext,
        hash: &str,
    ) -> CoreResult<ReadOutcome> {
        if hash.trim().is_empty() {
            return Err(TypeError::EmptyField("certificationHash").into());
        }
        let product = match self.store.find_by_certification_hash(hash)? {
            Some(product) => product,
            None => {
                debug!(parent: &ctx.span, hash, "no certification hash match; trying ledger reference");
                self.store
                    .find_by_ledger_ref(hash)?
                    .ok_or_else(|| CoreError::NotFound(format!("certificate {hash}")))?
            }
        };
        Ok(self.merge(ctx, product).await)
    }

    /// All products in creation order.
    pub fn list_products(&self, ctx: &OpContext) -> CoreResult<Vec<Product>> {
        let products = self.store.list_all()?;
        debug!(parent: &ctx.span, count = products.len(), "products listed");
        Ok(products)
    }

    // ---- Ledger plumbing ----

    async fn merge(&self, ctx: &OpContext, product: Product) -> ReadOutcome {
        let on_chain = self.on_chain(ctx, product.product_id()).await;
        ReadOutcome { product, on_chain }
    }

    /// Read and normalize the ledger record. Every failure degrades to `None`.
    async fn on_chain(&self, ctx: &OpContext, id: &ProductId) -> Option<Value> {
        let record = match self.bounded("read_record", self.ledger.read_record(id)).await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!(parent: &ctx.span, product_id = %id, "no on-chain record");
                return None;
            }
            Err(e) => {
                warn!(parent: &ctx.span, product_id = %id, error = %e, "on-chain read failed");
                return None;
            }
        };
        match self.normalizer.normalize(&record) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(parent: &ctx.span, product_id = %id, error = %e, "on-chain record not normalizable");
                None
            }
        }
    }

    /// Run a ledger write and turn its outcome into an [`Anchoring`].
    async fn anchor<F>(
        &self,
        ctx: &OpContext,
        id: &ProductId,
        operation: &'static str,
        call: F,
    ) -> Anchoring
    where
        F: Future<Output = LedgerResult<String>>,
    {
        match self.bounded(operation, call).await {
            Ok(tx_ref) => {
                debug!(parent: &ctx.span, product_id = %id, operation, tx_ref = %tx_ref, "anchored");
                Anchoring::Anchored { tx_ref }
            }
            Err(e) => {
                warn!(parent: &ctx.span, product_id = %id, operation, error = %e, "ledger call failed; continuing unanchored");
                Anchoring::Unanchored {
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> LedgerResult<T>
    where
        F: Future<Output = LedgerResult<T>>,
    {
        let limit = self.config.ledger_timeout;
        tokio::time::timeout(limit, call)
            .await
            .unwrap_or(Err(LedgerError::Timeout {
                operation,
                after_ms: limit.as_millis() as u64,
            }))
    }
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("config", &self.config)
            .field("normalizer", &self.normalizer)
            .finish()
    }
}
