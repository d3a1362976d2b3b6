//! Content fingerprinting for the provenance ledger.
//!
//! Provides domain-separated BLAKE3 digests rendered as lowercase hex.
//! Certificates are fingerprinted with [`ContentHasher::CERTIFICATE`];
//! the simulated ledger derives transaction references with
//! [`ContentHasher::TRANSACTION`].
//!
//! All operations are pure: no I/O, no shared state.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError};
