use num_bigint::BigInt;
use serde_json::{Number, Value};

/// A value tree as produced by the external ledger.
///
/// Ledger-native integers ([`LedgerValue::Integer`]) are arbitrary
/// precision and cannot be emitted as JSON numbers without loss; they are
/// turned into decimal strings by the [`ValueNormalizer`](crate::ValueNormalizer).
/// Maps keep insertion order.
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerValue {
    Null,
    Bool(bool),
    /// Ledger-native arbitrary-precision integer.
    Integer(BigInt),
    /// An ordinary JSON-safe number.
    Number(Number),
    Text(String),
    List(Vec<LedgerValue>),
    Map(Vec<(String, LedgerValue)>),
}

impl LedgerValue {
    /// Build a map from ordered key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, LedgerValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn integer(value: impl Into<BigInt>) -> Self {
        Self::Integer(value.into())
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Look up a key in a map value. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&LedgerValue> {
        match self {
            Self::Map(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[LedgerValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Decode a ledger gateway response.
    ///
    /// Gateways report ledger quantities (block numbers, timestamps,
    /// balances) as JSON integers, so every integral number becomes a
    /// [`LedgerValue::Integer`]. Fractional numbers stay plain numbers.
    pub fn from_gateway_json(value: Value) -> Self {
        match value {
            Value::Number(n) => match integral_digits(&n) {
                Some(i) => Self::Integer(i),
                None => Self::Number(n),
            },
            Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from_gateway_json).collect())
            }
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_gateway_json(v)))
                    .collect(),
            ),
            other => Self::from(other),
        }
    }
}

/// Exact integer value of a JSON number written without fraction or
/// exponent. Numbers keep their source text, so this holds past `u64`.
fn integral_digits(n: &Number) -> Option<BigInt> {
    let text = n.to_string();
    if text.contains(['.', 'e', 'E']) {
        return None;
    }
    text.parse().ok()
}

/// Plain JSON carries no ledger-native integers: numbers stay numbers.
impl From<Value> for LedgerValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::Text(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Value::Object(map) => {
                Self::Map(map.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl From<BigInt> for LedgerValue {
    fn from(value: BigInt) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for LedgerValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for LedgerValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for LedgerValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<LedgerValue>> for LedgerValue {
    fn from(value: Vec<LedgerValue>) -> Self {
        Self::List(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn map_preserves_insertion_order() {
        let v = LedgerValue::map([
            ("zeta", LedgerValue::Null),
            ("alpha", LedgerValue::Bool(true)),
        ]);
        let LedgerValue::Map(entries) = &v else {
            panic!("expected map");
        };
        assert_eq!(entries[0].0, "zeta");
        assert_eq!(entries[1].0, "alpha");
        assert_eq!(v.get("alpha"), Some(&LedgerValue::Bool(true)));
        assert_eq!(v.get("missing"), None);
    }

    #[test]
    fn plain_json_numbers_stay_numbers() {
        let v = LedgerValue::from(json!({"n": 5, "f": 1.5}));
        assert!(matches!(v.get("n"), Some(LedgerValue::Number(_))));
        assert!(matches!(v.get("f"), Some(LedgerValue::Number(_))));
    }

    #[test]
    fn gateway_integers_become_ledger_integers() {
        let v = LedgerValue::from_gateway_json(json!({
            "blockNumber": 19_000_000u64,
            "balance": u64::MAX,
            "delta": -3,
            "ratio": 0.25,
            "stages": [{"timestamp": 1_700_000_000}],
        }));
        assert_eq!(v.get("blockNumber"), Some(&LedgerValue::integer(19_000_000u64)));
        assert_eq!(v.get("balance"), Some(&LedgerValue::integer(u64::MAX)));
        assert_eq!(v.get("delta"), Some(&LedgerValue::integer(-3)));
        assert!(matches!(v.get("ratio"), Some(LedgerValue::Number(_))));
        let stages = v.get("stages").and_then(LedgerValue::as_list).unwrap();
        assert_eq!(
            stages[0].get("timestamp"),
            Some(&LedgerValue::integer(1_700_000_000))
        );
    }

    #[test]
    fn gateway_integers_beyond_u128_keep_every_digit() {
        let huge = "340282366920938463463374607431768211457";
        let body = format!(r#"{{"supply": {huge}, "debt": -{huge}, "rate": 1e3}}"#);
        let v = LedgerValue::from_gateway_json(serde_json::from_str(&body).unwrap());
        assert_eq!(
            v.get("supply"),
            Some(&LedgerValue::Integer(huge.parse().unwrap()))
        );
        assert_eq!(
            v.get("debt"),
            Some(&LedgerValue::Integer(format!("-{huge}").parse().unwrap()))
        );
        assert!(matches!(v.get("rate"), Some(LedgerValue::Number(_))));

        let out = crate::normalize(&v).unwrap();
        assert_eq!(out["supply"], json!(huge));
        assert_eq!(out["debt"], json!(format!("-{huge}")));
    }
}
