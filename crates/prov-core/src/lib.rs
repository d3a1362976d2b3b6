//! Reconciliation core for the provenance ledger.
//!
//! The [`Coordinator`] combines three collaborators under one rule:
//! off-chain durability is unconditional, on-chain anchoring is advisory.
//!
//! - the local [`ProvenanceStore`](prov_store::ProvenanceStore) must accept
//!   every write, or the operation fails
//! - the external [`LedgerClient`](prov_ledger::LedgerClient) is asked to
//!   anchor each write, and its failures are logged and absorbed
//! - anything read back from the ledger is normalized into transport-safe
//!   JSON before it leaves this crate
//!
//! Logging is injected per operation through [`OpContext`]; the core keeps
//! no ambient state of its own.

pub mod config;
pub mod context;
pub mod coordinator;
pub mod error;
pub mod outcome;

pub use config::CoordinatorConfig;
pub use context::OpContext;
pub use coordinator::Coordinator;
pub use error::{CoreError, CoreResult};
pub use outcome::{CreateOutcome, ReadOutcome, StageOutcome};
