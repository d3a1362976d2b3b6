use serde_json::{Map, Value};

use crate::error::{LedgerError, LedgerResult};
use crate::value::LedgerValue;

/// Nesting limit applied by [`normalize`].
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Converts ledger value trees into transport-safe JSON.
///
/// Depth-first and structural: integers become decimal strings, lists keep
/// their order, maps keep their keys and key order, every other scalar is
/// passed through unchanged. Trees nested deeper than `max_depth` are
/// reported as [`LedgerError::Serialization`] instead of being walked.
#[derive(Clone, Copy, Debug)]
pub struct ValueNormalizer {
    max_depth: usize,
}

impl ValueNormalizer {
    pub const fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn normalize(&self, value: &LedgerValue) -> LedgerResult<Value> {
        self.walk(value, 0)
    }

    fn walk(&self, value: &LedgerValue, depth: usize) -> LedgerResult<Value> {
        if depth > self.max_depth {
            return Err(LedgerError::Serialization(format!(
                "ledger value nested deeper than {} levels",
                self.max_depth
            )));
        }
        Ok(match value {
            LedgerValue::Null => Value::Null,
            LedgerValue::Bool(b) => Value::Bool(*b),
            LedgerValue::Integer(i) => Value::String(i.to_string()),
            LedgerValue::Number(n) => Value::Number(n.clone()),
            LedgerValue::Text(s) => Value::String(s.clone()),
            LedgerValue::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| self.walk(item, depth + 1))
                    .collect::<LedgerResult<_>>()?,
            ),
            LedgerValue::Map(entries) => {
                let mut map = Map::with_capacity(entries.len());
                for (key, item) in entries {
                    map.insert(key.clone(), self.walk(item, depth + 1)?);
                }
                Value::Object(map)
            }
        })
    }
}

impl Default for ValueNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Normalize with the default depth limit.
pub fn normalize(value: &LedgerValue) -> LedgerResult<Value> {
    ValueNormalizer::default().normalize(value)
}
