use ledger_common::Retryable;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    /// Required columns absent from at least one record, sorted.
    #[error("missing required columns: {}", .columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    /// Record at `index` has a different column set than the first record.
    #[error("record {index} has a different column set than record 0")]
    ColumnMismatch { index: usize },
}

impl Retryable for SchemaError {
    fn is_retryable(&self) -> bool {
        false
    }
}
