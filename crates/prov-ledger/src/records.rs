use serde::{Deserialize, Serialize};

use crate::value::LedgerValue;

/// Fields registered on-chain when a product is created.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordFields {
    pub product_id: String,
    pub name: String,
    pub origin: String,
    pub manufacturer: String,
    pub certification_hash: String,
}

/// Current on-chain state of a product, as returned by the ledger.
pub type LedgerRecord = LedgerValue;
