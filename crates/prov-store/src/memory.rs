use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use prov_types::{Product, ProductId, StageLabel};

use crate::error::{StoreError, StoreResult};
use crate::table::ProductTable;
use crate::traits::ProvenanceStore;

/// In-memory, HashMap-based product store.
///
/// Intended for tests and embedding. Products are held behind a `RwLock`;
/// every mutation takes the write lock for its whole duration, which makes
/// stage appends atomic.
pub struct InMemoryProvenanceStore {
    table: RwLock<ProductTable>,
}

impl InMemoryProvenanceStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            table: RwLock::new(ProductTable::new()),
        }
    }

    /// Number of products currently stored.
    pub fn len(&self) -> usize {
        self.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, ProductTable>> {
        self.table.read().map_err(|_| StoreError::LockPoisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, ProductTable>> {
        self.table.write().map_err(|_| StoreError::LockPoisoned)
    }
}

impl Default for InMemoryProvenanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProvenanceStore for InMemoryProvenanceStore {
    fn create(&self, product: &Product) -> StoreResult<()> {
        self.write()?.insert(product.clone())
    }

    fn append_stage(
        &self,
        id: &ProductId,
        stage: &StageLabel,
        reference: Option<&str>,
    ) -> StoreResult<Product> {
        self.write()?.push_stage(id, stage, reference)
    }

    fn set_ledger_ref(&self, id: &ProductId, reference: &str) -> StoreResult<Product> {
        self.write()?.set_ledger_ref(id, reference)
    }

    fn find_by_id(&self, id: &ProductId) -> StoreResult<Option<Product>> {
        Ok(self.read()?.get(id).cloned())
    }

    fn find_by_certification_hash(&self, hash: &str) -> StoreResult<Option<Product>> {
        Ok(self.read()?.by_certification_hash(hash).cloned())
    }

    fn find_by_ledger_ref(&self, reference: &str) -> StoreResult<Option<Product>> {
        Ok(self.read()?.by_ledger_ref(reference).cloned())
    }

    fn list_all(&self) -> StoreResult<Vec<Product>> {
        Ok(self.read()?.all())
    }

    fn count(&self) -> StoreResult<usize> {
        Ok(self.read()?.len())
    }
}

impl std::fmt::Debug for InMemoryProvenanceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryProvenanceStore")
            .field("product_count", &self.len())
            .finish()
    }
}
