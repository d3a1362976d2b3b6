use std::collections::HashMap;

use prov_types::{Product, ProductId, StageLabel};

use crate::error::{StoreError, StoreResult};

/// Products plus their secondary indexes.
///
/// Shared by every backend: the in-memory store keeps one behind a lock,
/// the journal store rebuilds one by replay. Mutations keep the indexes
/// consistent; callers serialize access.
#[derive(Debug, Default)]
pub struct ProductTable {
    products: HashMap<ProductId, Product>,
    order: Vec<ProductId>,
    by_cert: HashMap<String, ProductId>,
    /// Every product currently holding a reference, in the order they
    /// took it. Caller-supplied references are not unique.
    by_ref: HashMap<String, Vec<ProductId>>,
}

impl ProductTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: &ProductId) -> bool {
        self.products.contains_key(id)
    }

    /// Check that `product` could be inserted.
    pub fn check_insert(&self, product: &Product) -> StoreResult<()> {
        if self.contains(product.product_id()) {
            return Err(StoreError::Duplicate(product.product_id().clone()));
        }
        Ok(())
    }

    /// Check that `id` exists.
    pub fn check_exists(&self, id: &ProductId) -> StoreResult<()> {
        if !self.contains(id) {
            return Err(StoreError::NotFound(id.clone()));
        }
        Ok(())
    }

    /// Check that a stage append carrying `reference` would succeed.
    pub fn check_append(&self, id: &ProductId, reference: Option<&str>) -> StoreResult<()> {
        if reference == Some("") {
            return Err(StoreError::EmptyLedgerRef(id.clone()));
        }
        self.check_exists(id)
    }

    pub fn insert(&mut self, product: Product) -> StoreResult<()> {
        self.check_insert(&product)?;
        let id = product.product_id().clone();
        if !product.certification_hash().is_empty() {
            self.by_cert
                .entry(product.certification_hash().to_string())
                .or_insert_with(|| id.clone());
        }
        if !product.blockchain_ref_hash().is_empty() {
            self.index_ref(product.blockchain_ref_hash(), &id);
        }
        self.order.push(id.clone());
        self.products.insert(id, product);
        Ok(())
    }

    /// Append a stage and, when given, move the product to a new ledger
    /// reference. Nothing changes unless both succeed.
    pub fn push_stage(
        &mut self,
        id: &ProductId,
        stage: &StageLabel,
        reference: Option<&str>,
    ) -> StoreResult<Product> {
        self.check_append(id, reference)?;
        if let Some(reference) = reference {
            self.set_ledger_ref(id, reference)?;
        }
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        product.push_stage(stage);
        Ok(product.clone())
    }

    pub fn set_ledger_ref(&mut self, id: &ProductId, reference: &str) -> StoreResult<Product> {
        let product = self
            .products
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let previous = product
            .set_blockchain_ref(reference)
            .map_err(|_| StoreError::EmptyLedgerRef(id.clone()))?;
        let updated = product.clone();

        if previous != reference {
            self.unindex_ref(&previous, id);
            self.index_ref(reference, id);
        }
        Ok(updated)
    }

    fn index_ref(&mut self, reference: &str, id: &ProductId) {
        self.by_ref
            .entry(reference.to_string())
            .or_default()
            .push(id.clone());
    }

    fn unindex_ref(&mut self, reference: &str, id: &ProductId) {
        if let Some(holders) = self.by_ref.get_mut(reference) {
            holders.retain(|held| held != id);
            if holders.is_empty() {
                self.by_ref.remove(reference);
            }
        }
    }

    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.products.get(id)
    }

    pub fn by_certification_hash(&self, hash: &str) -> Option<&Product> {
        self.by_cert.get(hash).and_then(|id| self.products.get(id))
    }

    /// Earliest product still holding `reference`.
    pub fn by_ledger_ref(&self, reference: &str) -> Option<&Product> {
        self.by_ref
            .get(reference)
            .and_then(|holders| holders.first())
            .and_then(|id| self.products.get(id))
    }

    /// All products in creation order.
    pub fn all(&self) -> Vec<Product> {
        self.order
            .iter()
            .filter_map(|id| self.products.get(id))
            .cloned()
            .collect()
    }
}
