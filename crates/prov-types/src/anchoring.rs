use serde::{Deserialize, Serialize};

/// Prefix of locally generated stand-in ledger references.
pub const PLACEHOLDER_PREFIX: &str = "pending-";

/// Outcome of an attempt to anchor a write on the external ledger.
///
/// Callers that need to know whether a record is anchored inspect this tag,
/// not the shape of the stored reference string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum Anchoring {
    /// The ledger accepted the write under this transaction reference.
    Anchored {
        #[serde(rename = "txRef")]
        tx_ref: String,
    },
    /// The ledger call failed or timed out.
    Unanchored { reason: String },
}

impl Anchoring {
    pub fn is_anchored(&self) -> bool {
        matches!(self, Self::Anchored { .. })
    }

    /// The transaction reference, when anchoring succeeded.
    pub fn tx_ref(&self) -> Option<&str> {
        match self {
            Self::Anchored { tx_ref } => Some(tx_ref),
            Self::Unanchored { .. } => None,
        }
    }
}

/// Generate a fresh placeholder reference.
///
/// Placeholders are time-ordered (UUID v7) and unique, so two unanchored
/// products never share one.
pub fn placeholder_ref() -> String {
    format!("{PLACEHOLDER_PREFIX}{}", uuid::Uuid::now_v7())
}

/// Returns `true` if `reference` was produced by [`placeholder_ref`].
pub fn is_placeholder_ref(reference: &str) -> bool {
    reference
        .strip_prefix(PLACEHOLDER_PREFIX)
        .is_some_and(|rest| uuid::Uuid::parse_str(rest).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholders_are_recognised() {
        let p = placeholder_ref();
        assert!(p.starts_with(PLACEHOLDER_PREFIX));
        assert!(is_placeholder_ref(&p));
    }

    #[test]
    fn real_references_are_not_placeholders() {
        assert!(!is_placeholder_ref("0xabc"));
        assert!(!is_placeholder_ref("tx-42"));
        assert!(!is_placeholder_ref("pending-"));
        assert!(!is_placeholder_ref("pending-not-a-uuid"));
    }

    #[test]
    fn placeholders_are_unique_and_ordered() {
        let a = placeholder_ref();
        let b = placeholder_ref();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn anchoring_accessors() {
        let ok = Anchoring::Anchored {
            tx_ref: "0x01".into(),
        };
        assert!(ok.is_anchored());
        assert_eq!(ok.tx_ref(), Some("0x01"));

        let failed = Anchoring::Unanchored {
            reason: "timeout".into(),
        };
        assert!(!failed.is_anchored());
        assert_eq!(failed.tx_ref(), None);
    }

    #[test]
    fn anchoring_serializes_with_status_tag() {
        let json = serde_json::to_value(Anchoring::Anchored {
            tx_ref: "0x01".into(),
        })
        .unwrap();
        assert_eq!(json["status"], "anchored");
        assert_eq!(json["txRef"], "0x01");
    }
}
