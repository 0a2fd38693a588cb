use std::collections::BTreeSet;

use ledger_model::{AUDIT_COLUMNS, DEFAULT_BUSINESS_ID_COLUMN};

/// Columns every record must contain. Extra columns are allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedSchema {
    required: BTreeSet<String>,
}

impl Default for ExpectedSchema {
    fn default() -> Self {
        Self::for_business_id(DEFAULT_BUSINESS_ID_COLUMN)
    }
}

impl ExpectedSchema {
    /// Business id column plus `created_at`, `updated_at`, `original_headers`.
    pub fn for_business_id(column: &str) -> Self {
        let required = std::iter::once(column)
            .chain(AUDIT_COLUMNS)
            .map(str::to_string)
            .collect();
        Self { required }
    }

    pub fn required(&self) -> impl Iterator<Item = &str> {
        self.required.iter().map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.required.contains(column)
    }
}
