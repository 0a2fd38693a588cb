use ledger_common::Retryable;
use ledger_model::ModelError;
use thiserror::Error;

use crate::rules::ColumnKind;

/// Structural coercion failures. Bad cells never produce one of these.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoercionError {
    #[error("column {column} has conflicting coercion rules: {first} and {second}")]
    ConflictingRules {
        column: String,
        first: ColumnKind,
        second: ColumnKind,
    },
}

impl Retryable for CoercionError {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("input has no data rows")]
    EmptyInput,

    #[error(transparent)]
    Coercion(#[from] CoercionError),

    #[error("cannot shape records: {0}")]
    Table(#[from] ModelError),

    #[error("cannot serialize original headers: {0}")]
    HeaderJson(#[from] serde_json::Error),
}

impl Retryable for BuildError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Coercion(err) => err.is_retryable(),
            Self::EmptyInput | Self::Table(_) | Self::HeaderJson(_) => false,
        }
    }
}
