use prov_types::{Anchoring, Product};
use serde::Serialize;
use serde_json::Value;

/// Result of creating a product.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    /// The product as persisted.
    pub product: Product,
    /// Whether the ledger accepted the create.
    pub anchoring: Anchoring,
    /// The reference stored as `blockchainRefHash`: the transaction
    /// reference when anchored, otherwise the fallback.
    pub transaction_ref: String,
}

/// Result of appending a custody-chain stage.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageOutcome {
    pub product: Product,
    pub anchoring: Anchoring,
}

impl StageOutcome {
    /// Transaction reference for this append, if the ledger accepted it.
    pub fn transaction_ref(&self) -> Option<&str> {
        self.anchoring.tx_ref()
    }
}

/// Local record merged with the best-effort on-chain view.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadOutcome {
    pub product: Product,
    /// Normalized ledger record, or `None` when the ledger had nothing or
    /// could not be read.
    pub on_chain: Option<Value>,
}
