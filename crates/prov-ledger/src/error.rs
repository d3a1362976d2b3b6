/// Errors produced while talking to the external ledger.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("ledger call `{operation}` timed out after {after_ms}ms")]
    Timeout {
        operation: &'static str,
        after_ms: u64,
    },

    #[error("ledger unavailable: {0}")]
    Unavailable(String),

    #[error("ledger rejected the transaction: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected ledger response: {0}")]
    Decode(String),

    /// A ledger value could not be converted into transport-safe data.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
