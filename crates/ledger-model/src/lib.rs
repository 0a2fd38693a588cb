//! Data model for the ledger ingestion pipeline.
//!
//! - [`Value`]: typed cell (string, integer, float, date, null)
//! - [`Table`]: column-oriented working set passed between stages
//! - [`Record`] / [`Batch`]: enriched rows handed to the warehouse
//! - [`HeaderMap`]: original header → normalized header, kept for audit

pub mod columns;
pub mod error;
pub mod header;
pub mod record;
pub mod table;
pub mod value;

pub use columns::{
    AUDIT_COLUMNS, CREATED_AT, DEFAULT_BUSINESS_ID_COLUMN, ORIGINAL_HEADERS, UPDATED_AT,
};
pub use error::{ModelError, Result};
pub use header::HeaderMap;
pub use record::{Batch, Record};
pub use table::Table;
pub use value::Value;
