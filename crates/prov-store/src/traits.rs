use prov_types::{Product, ProductId, StageLabel};

use crate::error::StoreResult;

/// Durable keyed store for products.
///
/// All implementations must satisfy these invariants:
/// - `create` rejects a duplicate product id with `StoreError::Duplicate`.
/// - `append_stage` is an atomic push: concurrent appends to the same
///   product both land, each exactly once, without reordering earlier stages.
///   A reference passed with the stage is stored in the same write, so the
///   stage and its reference land together or not at all.
/// - `set_ledger_ref` touches only the ledger reference and never stores an
///   empty one.
/// - All I/O errors are propagated, never silently ignored.
pub trait ProvenanceStore: Send + Sync {
    /// Persist a new product.
    fn create(&self, product: &Product) -> StoreResult<()>;

    /// Atomically append a stage, optionally replacing the ledger reference,
    /// and return the updated product.
    ///
    /// Returns `StoreError::NotFound` if the product does not exist and
    /// `StoreError::EmptyLedgerRef` for `Some("")`; neither stores anything.
    fn append_stage(
        &self,
        id: &ProductId,
        stage: &StageLabel,
        reference: Option<&str>,
    ) -> StoreResult<Product>;

    /// Replace the product's ledger reference and return the updated product.
    fn set_ledger_ref(&self, id: &ProductId, reference: &str) -> StoreResult<Product>;

    fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>>;

    /// First product created with this certification hash.
    fn find_by_certification_hash(&self, hash: &str) -> StoreResult<Option<Product>>;

    /// Earliest-recorded product whose current ledger reference is
    /// `reference`.
    ///
    /// Serves records created before certification hashes were indexed.
    fn find_by_ledger_ref(&self, reference: &str) -> StoreResult<Option<Product>>;

    /// All products in creation order.
    fn list_all(&self) -> StoreResult<Vec<Product>>;

    /// Number of stored products.
    ///
    /// Default implementation lists everything. Backends may override.
    fn count(&self) -> StoreResult<usize> {
        Ok(self.list_all()?.len())
    }
}
