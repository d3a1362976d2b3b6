//! Foundation types for the provenance ledger.
//!
//! Every other `prov-*` crate depends on this one.
//!
//! # Key Types
//!
//! - [`ProductId`] — caller-assigned, immutable product identifier
//! - [`Product`] — the locally owned, authoritative product record
//! - [`ProductInput`] — the validated set of fields accepted on creation
//! - [`Anchoring`] — whether a write was anchored on the external ledger
//! - [`StageLabel`] — a non-empty custody-chain stage label

pub mod anchoring;
pub mod error;
pub mod product;

pub use anchoring::{is_placeholder_ref, placeholder_ref, Anchoring, PLACEHOLDER_PREFIX};
pub use error::TypeError;
pub use product::{Product, ProductId, ProductInput, StageLabel};
