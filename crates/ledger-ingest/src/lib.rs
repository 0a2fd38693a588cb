//! Source file ingestion for the ledger pipeline.
//!
//! # Features
//!
//! - **Access check**: fail fast when the input file is missing or unreadable
//! - **CSV loading**: read every cell as text into a [`RawTable`]
//! - **Header normalization**: map display headers to canonical identifiers
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use ledger_ingest::{HeaderCollisionPolicy, check_input_access, normalize_headers, read_csv_table};
//!
//! let path = Path::new("estoque.csv");
//! check_input_access(path)?;
//! let raw = read_csv_table(path)?;
//! let headers = normalize_headers(&raw.headers, &["restaurant_id"], HeaderCollisionPolicy::default())?;
//! let table = raw.into_table(&headers)?;
//! ```

mod csv;
mod error;

// === Error Types ===
pub use error::{HeaderCollision, IngestError, NormalizationError, Result};

// === CSV Reading ===
pub use csv::{
    HeaderCollisionPolicy, RawTable, check_input_access, normalize_header, normalize_headers,
    read_csv_table, validate_encoding,
};
