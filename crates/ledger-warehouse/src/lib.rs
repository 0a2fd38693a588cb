//! Append-only loading of ledger batches.
//!
//! [`WarehouseLoader`] is the seam between the pipeline and storage. Shipped
//! implementations:
//!
//! - [`BigQueryLoader`]: BigQuery load jobs over the REST API
//! - [`NdjsonFileLoader`]: newline-delimited JSON files on local disk
//! - [`MemoryLoader`]: keeps batches in memory (tests and dry runs)

mod error;
mod loader;
mod memory;
mod ndjson;
mod table;

pub mod bigquery;

pub use bigquery::{BigQueryLoader, CredentialsFile, StaticToken, TokenSource};
pub use error::{LoadError, Result};
pub use loader::WarehouseLoader;
pub use memory::MemoryLoader;
pub use ndjson::NdjsonFileLoader;
pub use table::{LoadReceipt, TableRef};
