//! Adapter to the external, append-only ledger.
//!
//! Everything in this crate is best-effort from the caller's point of view:
//! a [`LedgerError`] is something to log and degrade on, never a reason to
//! abandon a local write.
//!
//! - [`LedgerClient`] — the create/append/read boundary
//! - [`InMemoryLedger`] — simulated chain with fault injection, for tests and local runs
//! - [`HttpLedgerClient`] — JSON adapter for a remote ledger gateway
//! - [`LedgerValue`] / [`ValueNormalizer`] — ledger-native value trees and
//!   their conversion into transport-safe JSON

pub mod error;
pub mod http;
pub mod memory;
pub mod normalize;
pub mod records;
pub mod traits;
pub mod value;

pub use error::{LedgerError, LedgerResult};
pub use http::HttpLedgerClient;
pub use memory::{FaultMode, InMemoryLedger};
pub use normalize::{normalize, ValueNormalizer, DEFAULT_MAX_DEPTH};
pub use records::{LedgerRecord, RecordFields};
pub use traits::LedgerClient;
pub use value::LedgerValue;
