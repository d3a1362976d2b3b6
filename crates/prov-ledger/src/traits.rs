use async_trait::async_trait;
use prov_types::{ProductId, StageLabel};

use crate::error::LedgerResult;
use crate::records::{LedgerRecord, RecordFields};

/// Boundary to the external, append-only ledger.
///
/// Implementations report failures as [`LedgerError`](crate::LedgerError)
/// and never retry internally. Bounding the duration of a call is the
/// caller's job.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Register a new on-chain record. Returns the transaction reference.
    async fn create_record(&self, id: &ProductId, fields: &RecordFields) -> LedgerResult<String>;

    /// Append a custody-chain event. Returns the transaction reference.
    async fn append_stage(&self, id: &ProductId, stage: &StageLabel) -> LedgerResult<String>;

    /// Fetch the current on-chain state, or `None` if the ledger has no
    /// record for `id`.
    async fn read_record(&self, id: &ProductId) -> LedgerResult<Option<LedgerRecord>>;
}
