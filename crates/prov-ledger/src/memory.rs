use std::collections::HashMap;
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use prov_crypto::ContentHasher;
use prov_types::{ProductId, StageLabel};
use serde_json::json;

use crate::error::{LedgerError, LedgerResult};
use crate::records::{LedgerRecord, RecordFields};
use crate::traits::LedgerClient;
use crate::value::LedgerValue;

/// Fault injected into every call of an [`InMemoryLedger`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum FaultMode {
    #[default]
    Healthy,
    /// Every call fails with [`LedgerError::Unavailable`].
    Failing,
    /// Every call sleeps for the given duration before answering.
    Latency(Duration),
}

/// Simulated append-only chain for tests, local runs, and embedding.
///
/// Each successful write mines one block and returns a `0x`-prefixed
/// transaction hash. Records expose block numbers and timestamps as
/// ledger-native integers, like a real chain would.
pub struct InMemoryLedger {
    inner: RwLock<ChainState>,
    fault: Mutex<FaultMode>,
}

struct ChainState {
    block_number: u64,
    records: HashMap<ProductId, ChainRecord>,
}

struct ChainRecord {
    fields: RecordFields,
    created_at: i64,
    created_block: u64,
    stages: Vec<ChainStage>,
    latest_tx: String,
}

struct ChainStage {
    label: String,
    timestamp: i64,
    block: u64,
}

impl InMemoryLedger {
    /// Create a chain whose next block is `start_block`.
    pub fn new(start_block: u64) -> Self {
        Self {
            inner: RwLock::new(ChainState {
                block_number: start_block,
                records: HashMap::new(),
            }),
            fault: Mutex::new(FaultMode::Healthy),
        }
    }

    pub fn with_fault(self, mode: FaultMode) -> Self {
        self.set_fault(mode);
        self
    }

    pub fn set_fault(&self, mode: FaultMode) {
        match self.fault.lock() {
            Ok(mut guard) => *guard = mode,
            Err(poisoned) => *poisoned.into_inner() = mode,
        }
    }

    /// Number of records on the chain.
    pub fn record_count(&self) -> usize {
        self.inner.read().map(|s| s.records.len()).unwrap_or(0)
    }

    /// Block number the next transaction will be mined in.
    pub fn next_block(&self) -> u64 {
        self.inner.read().map(|s| s.block_number).unwrap_or(0)
    }

    async fn apply_fault(&self, operation: &'static str) -> LedgerResult<()> {
        let mode = self
            .fault
            .lock()
            .map(|g| g.clone())
            .map_err(|_| LedgerError::Unavailable("fault lock poisoned".into()))?;
        match mode {
            FaultMode::Healthy => Ok(()),
            FaultMode::Failing => Err(LedgerError::Unavailable(format!(
                "simulated outage during {operation}"
            ))),
            FaultMode::Latency(delay) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }

    fn write_state(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, ChainState>> {
        self.inner
            .write()
            .map_err(|_| LedgerError::Unavailable("chain write lock poisoned".into()))
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(1)
    }
}

impl std::fmt::Debug for InMemoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryLedger")
            .field("record_count", &self.record_count())
            .field("next_block", &self.next_block())
            .finish()
    }
}

#[async_trait]
impl LedgerClient for InMemoryLedger {
    async fn create_record(&self, id: &ProductId, fields: &RecordFields) -> LedgerResult<String> {
        self.apply_fault("create_record").await?;
        let mut state = self.write_state()?;

        if state.records.contains_key(id) {
            return Err(LedgerError::Rejected(format!("record {id} already exists")));
        }

        let block = state.block_number;
        let payload =
            serde_json::to_value(fields).map_err(|e| LedgerError::Serialization(e.to_string()))?;
        let tx = tx_hash(block, "create", id, &payload)?;
        state.records.insert(
            id.clone(),
            ChainRecord {
                fields: fields.clone(),
                created_at: chrono::Utc::now().timestamp(),
                created_block: block,
                stages: Vec::new(),
                latest_tx: tx.clone(),
            },
        );
        state.block_number += 1;

        tracing::debug!(product_id = %id, block, tx = %tx, "simulated ledger record created");
        Ok(tx)
    }

    async fn append_stage(&self, id: &ProductId, stage: &StageLabel) -> LedgerResult<String> {
        self.apply_fault("append_stage").await?;
        let mut state = self.write_state()?;

        let block = state.block_number;
        let tx = tx_hash(block, "stage", id, &json!(stage.as_str()))?;
        let record = state
            .records
            .get_mut(id)
            .ok_or_else(|| LedgerError::Rejected(format!("record {id} does not exist")))?;
        record.stages.push(ChainStage {
            label: stage.as_str().to_string(),
            timestamp: chrono::Utc::now().timestamp(),
            block,
        });
        record.latest_tx = tx.clone();
        state.block_number += 1;

        tracing::debug!(product_id = %id, block, tx = %tx, "simulated ledger stage appended");
        Ok(tx)
    }

    async fn read_record(&self, id: &ProductId) -> LedgerResult<Option<LedgerRecord>> {
        self.apply_fault("read_record").await?;
        let state = self
            .inner
            .read()
            .map_err(|_| LedgerError::Unavailable("chain read lock poisoned".into()))?;

        Ok(state.records.get(id).map(|record| {
            let stages = record
                .stages
                .iter()
                .map(|s| {
                    LedgerValue::map([
                        ("stage", LedgerValue::text(s.label.clone())),
                        ("timestamp", LedgerValue::integer(s.timestamp)),
                        ("blockNumber", LedgerValue::integer(s.block)),
                    ])
                })
                .collect();
            LedgerValue::map([
                ("productId", LedgerValue::text(record.fields.product_id.clone())),
                ("name", LedgerValue::text(record.fields.name.clone())),
                ("origin", LedgerValue::text(record.fields.origin.clone())),
                ("manufacturer", LedgerValue::text(record.fields.manufacturer.clone())),
                (
                    "certificationHash",
                    LedgerValue::text(record.fields.certification_hash.clone()),
                ),
                ("createdAt", LedgerValue::integer(record.created_at)),
                ("blockNumber", LedgerValue::integer(record.created_block)),
                ("stages", LedgerValue::List(stages)),
                ("latestTx", LedgerValue::text(record.latest_tx.clone())),
            ])
        }))
    }
}

fn tx_hash(
    block: u64,
    op: &str,
    id: &ProductId,
    payload: &serde_json::Value,
) -> LedgerResult<String> {
    let digest = ContentHasher::TRANSACTION
        .digest_json(&json!({
            "block": block,
            "op": op,
            "productId": id.as_str(),
            "payload": payload,
        }))
        .map_err(|e| LedgerError::Serialization(e.to_string()))?;
    Ok(format!("0x{digest}"))
}
