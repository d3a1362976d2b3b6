use thiserror::Error;

/// Errors produced while validating caller input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("required field is empty: {0}")]
    EmptyField(&'static str),

    #[error("field {field} exceeds {max} bytes")]
    TooLong { field: &'static str, max: usize },
}
