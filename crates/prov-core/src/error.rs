use prov_store::StoreError;
use prov_types::{ProductId, TypeError};
use thiserror::Error;

/// Errors surfaced by coordinator operations.
///
/// Ledger failures never appear here; they are absorbed where the ledger
/// is called and show up only as missing anchoring or a null on-chain view.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Malformed or missing input. Nothing was written.
    #[error("invalid input: {0}")]
    Validation(#[from] TypeError),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("product already exists: {0}")]
    Duplicate(ProductId),

    /// The local store failed; the operation did not complete.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(id) => Self::Duplicate(id),
            StoreError::NotFound(id) => Self::NotFound(format!("product {id}")),
            other => Self::Storage(other),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
