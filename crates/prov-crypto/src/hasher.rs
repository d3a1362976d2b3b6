/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a certificate and a transaction payload with identical
/// bytes still produce different digests.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for certificate content (`certificationHash`).
    pub const CERTIFICATE: Self = Self {
        domain: "prov-cert-v1",
    };
    /// Hasher for ledger transaction payloads.
    pub const TRANSACTION: Self = Self {
        domain: "prov-tx-v1",
    };

    /// Raw 32-byte digest of `data` with domain separation.
    fn hash(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Lowercase hex digest of `data`.
    pub fn digest(&self, data: &[u8]) -> String {
        hex::encode(self.hash(data))
    }

    /// Hex digest of a serializable value encoded as JSON.
    pub fn digest_json<T: serde::Serialize>(&self, value: &T) -> Result<String, HasherError> {
        let data =
            serde_json::to_vec(value).map_err(|e| HasherError::Serialization(e.to_string()))?;
        Ok(self.digest(&data))
    }

    /// Check that `data` produces `expected` (hex, case-insensitive).
    pub fn verify(&self, data: &[u8], expected: &str) -> bool {
        self.digest(data).eq_ignore_ascii_case(expected)
    }
}

/// Errors from hashing operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HasherError {
    #[error("serialization error: {0}")]
    Serialization(String),
}
