use prov_types::ProductId;

/// Errors from product store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A product with this id already exists.
    #[error("product already exists: {0}")]
    Duplicate(ProductId),

    /// The requested product was not found.
    #[error("product not found: {0}")]
    NotFound(ProductId),

    /// Attempted to clear a product's ledger reference.
    #[error("ledger reference for {0} cannot be empty")]
    EmptyLedgerRef(ProductId),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The journal is damaged somewhere other than its tail.
    #[error("corrupt journal at offset {offset}: {reason}")]
    Corrupt { offset: u64, reason: String },

    /// A previous failure left the store unable to accept writes.
    #[error("store is unavailable: {0}")]
    Unavailable(String),

    #[error("store lock poisoned")]
    LockPoisoned,
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
