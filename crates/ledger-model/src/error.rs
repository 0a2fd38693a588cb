use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("column '{column}' already exists")]
    DuplicateColumn { column: String },
    #[error("column index {index} is out of bounds for a table with {width} columns")]
    ColumnIndex { index: usize, width: usize },
    #[error("a batch must contain at least one record")]
    EmptyBatch,
}

pub type Result<T> = std::result::Result<T, ModelError>;
