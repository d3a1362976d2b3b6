//! Durable local store of product records.
//!
//! The store is the system of record for product existence. Unlike the
//! external ledger, its failures are always surfaced to the caller.
//!
//! # Backends
//!
//! All backends implement the [`ProvenanceStore`] trait:
//!
//! - [`InMemoryProvenanceStore`] -- `HashMap`-based store for tests and embedding
//! - [`FileProvenanceStore`] -- append-only journal, fsynced per write, replayed on open
//!
//! # Design Rules
//!
//! 1. Every mutation is a single atomic operation under the store's lock:
//!    `create`, `append_stage`, `set_ledger_ref`. Callers never
//!    read-modify-write.
//! 2. `stages` only grows; appends to the same product are serialized.
//! 3. A ledger reference is never cleared once set.
//! 4. Lookups by certification hash and by ledger reference go through
//!    indexes maintained alongside every mutation; first match wins.

pub mod error;
pub mod journal;
pub mod memory;
pub mod table;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use journal::{FileProvenanceStore, JournalEntry, SyncMode, JOURNAL_FILE_NAME};
pub use memory::InMemoryProvenanceStore;
pub use traits::ProvenanceStore;
