//! Error types for source file ingestion.

use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;

use ledger_common::Retryable;
use thiserror::Error;

/// Errors that can occur while checking and reading the source file.
#[derive(Debug, Error)]
pub enum IngestError {
    // === Access Errors (detected before processing) ===
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// File exists but cannot be opened for reading.
    #[error("no permission to read file: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path points at a directory or other non-file entry.
    #[error("not a regular file: {path}")]
    NotAFile { path: PathBuf },

    // === Read Errors ===
    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File starts with a byte-order mark we cannot decode.
    #[error("unsupported encoding {encoding} in {path}; save the file as UTF-8")]
    UnsupportedEncoding {
        path: PathBuf,
        encoding: &'static str,
    },

    // === CSV Parsing Errors ===
    /// Malformed CSV content.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// CSV file has no header row.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// A data row carries non-empty values beyond the last header.
    #[error("row {row} in {path} has {found} fields but the header has {expected}")]
    RowTooWide {
        path: PathBuf,
        row: usize,
        found: usize,
        expected: usize,
    },

    /// Header map does not line up with the table it should rename.
    #[error("header map has {found} entries but the table has {expected} columns")]
    HeaderMismatch { expected: usize, found: usize },

    /// Rows do not fit the table shape.
    #[error(transparent)]
    Table(#[from] ledger_model::ModelError),
}

impl Retryable for IngestError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::FileRead { source, .. } => matches!(
                source.kind(),
                ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
            ),
            _ => false,
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Several source headers that normalize to the same column name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCollision {
    /// The shared normalized name.
    pub normalized: String,
    /// Original headers (or reserved column names) claiming it, in file order.
    pub originals: Vec<String>,
}

impl fmt::Display for HeaderCollision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' <- ", self.normalized)?;
        let quoted: Vec<String> = self.originals.iter().map(|o| format!("'{o}'")).collect();
        write!(f, "[{}]", quoted.join(", "))
    }
}

/// Errors raised while building the header map.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("headers collide after normalization: {}", join_collisions(.collisions))]
    Collision { collisions: Vec<HeaderCollision> },
}

fn join_collisions(collisions: &[HeaderCollision]) -> String {
    collisions
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Retryable for NormalizationError {
    fn is_retryable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileNotFound {
            path: PathBuf::from("/path/to/file.csv"),
        };
        assert_eq!(err.to_string(), "CSV file not found: /path/to/file.csv");
    }

    #[test]
    fn test_retryable() {
        let transient = IngestError::FileRead {
            path: PathBuf::from("x.csv"),
            source: std::io::Error::new(ErrorKind::TimedOut, "slow disk"),
        };
        assert!(transient.is_retryable());

        let broken = IngestError::FileRead {
            path: PathBuf::from("x.csv"),
            source: std::io::Error::new(ErrorKind::InvalidData, "garbage"),
        };
        assert!(!broken.is_retryable());

        let parse = IngestError::CsvParse {
            path: PathBuf::from("x.csv"),
            message: "bad quote".to_string(),
        };
        assert!(!parse.is_retryable());
    }

    #[test]
    fn test_collision_display() {
        let err = NormalizationError::Collision {
            collisions: vec![HeaderCollision {
                normalized: "custo".to_string(),
                originals: vec!["Custo".to_string(), "custo!".to_string()],
            }],
        };
        assert_eq!(
            err.to_string(),
            "headers collide after normalization: 'custo' <- ['Custo', 'custo!']"
        );
    }
}
