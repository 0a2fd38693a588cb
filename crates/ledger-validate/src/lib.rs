//! Batch schema validation.
//!
//! The last gate before the warehouse: every record must carry the business
//! id and audit columns, and all records must share one column set.

mod error;
mod schema;
mod validator;

pub use error::SchemaError;
pub use schema::ExpectedSchema;
pub use validator::validate_batch;
