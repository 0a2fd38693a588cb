//! Ledger batch transformation.
//!
//! Turns a normalized [`Table`](ledger_model::Table) of source text into a
//! [`Batch`](ledger_model::Batch) ready for the warehouse:
//!
//! - **Coercion**: typed conversion of known columns with fixed fallbacks
//! - **Record building**: business id, audit timestamps, original headers
//!
//! # Example
//!
//! ```ignore
//! use ledger_transform::{CoercionRules, RecordBuilder, TypeCoercer};
//!
//! let builder = RecordBuilder::new(TypeCoercer::new(CoercionRules::default()));
//! let batch = builder.build(table, "rest-42", &header_map)?;
//! ```

mod builder;
mod error;
mod rules;

pub mod coerce;

// Core types
pub use rules::{CoercionRules, ColumnKind};

// Error types
pub use error::{BuildError, CoercionError};

// Coercion
pub use coerce::TypeCoercer;

// Record building
pub use builder::{RecordBuilder, format_timestamp};
