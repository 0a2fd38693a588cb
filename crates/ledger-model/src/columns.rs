//! Column names added by the record builder.

/// Business identifier column used when none is configured.
pub const DEFAULT_BUSINESS_ID_COLUMN: &str = "restaurant_id";

/// Batch creation timestamp (ISO 8601, UTC).
pub const CREATED_AT: &str = "created_at";

/// Batch update timestamp; equal to `created_at` on insert.
pub const UPDATED_AT: &str = "updated_at";

/// JSON object mapping each source header to its normalized name.
pub const ORIGINAL_HEADERS: &str = "original_headers";

/// Audit columns appended to every record, in output order.
pub const AUDIT_COLUMNS: [&str; 3] = [CREATED_AT, UPDATED_AT, ORIGINAL_HEADERS];
