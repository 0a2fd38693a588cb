//! CSV reading utilities.

mod header;
mod reader;

pub use header::{HeaderCollisionPolicy, normalize_header, normalize_headers};
pub use reader::{RawTable, check_input_access, read_csv_table, validate_encoding};
