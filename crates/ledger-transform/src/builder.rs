//! Shapes a coerced table into the warehouse batch.

use chrono::{DateTime, SecondsFormat, Utc};
use ledger_common::RetryPolicy;
use ledger_model::{
    Batch, CREATED_AT, DEFAULT_BUSINESS_ID_COLUMN, HeaderMap, ORIGINAL_HEADERS, Table,
    UPDATED_AT, Value,
};
use tracing::info;

use crate::coerce::TypeCoercer;
use crate::error::BuildError;

/// Audit timestamp text: RFC 3339, microseconds, `+00:00` offset.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, false)
}

/// Builds a [`Batch`] from a normalized table.
///
/// Record layout: business id, source columns in file order, then
/// `created_at`, `updated_at` and `original_headers`.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    coercer: TypeCoercer,
    retry: RetryPolicy,
    business_id_column: String,
}

impl RecordBuilder {
    pub fn new(coercer: TypeCoercer) -> Self {
        Self {
            coercer,
            retry: RetryPolicy::default(),
            business_id_column: DEFAULT_BUSINESS_ID_COLUMN.to_string(),
        }
    }

    /// Policy wrapped around the coercion step.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_business_id_column(mut self, column: impl Into<String>) -> Self {
        self.business_id_column = column.into();
        self
    }

    pub fn business_id_column(&self) -> &str {
        &self.business_id_column
    }

    /// Build with the current UTC time as the batch timestamp.
    pub fn build(
        &self,
        table: Table,
        business_id: &str,
        headers: &HeaderMap,
    ) -> Result<Batch, BuildError> {
        self.build_at(table, business_id, headers, Utc::now())
    }

    /// Build with a caller-supplied batch timestamp.
    ///
    /// Every record gets the same `created_at` and `updated_at`.
    pub fn build_at(
        &self,
        mut table: Table,
        business_id: &str,
        headers: &HeaderMap,
        timestamp: DateTime<Utc>,
    ) -> Result<Batch, BuildError> {
        if table.is_empty() {
            return Err(BuildError::EmptyInput);
        }

        table.insert_column(0, self.business_id_column.as_str(), Value::from(business_id))?;

        let mut table = self
            .retry
            .run("coerce types", || self.coercer.coerce(table.clone()))?;

        let stamp = format_timestamp(timestamp);
        table.push_column(CREATED_AT, Value::from(stamp.as_str()))?;
        table.push_column(UPDATED_AT, Value::from(stamp))?;
        table.push_column(ORIGINAL_HEADERS, Value::from(headers.to_json()?))?;

        let columns = table.width();
        let batch = Batch::new(table.into_records())?;
        info!(
            business_id,
            records = batch.len(),
            columns,
            "built record batch"
        );
        Ok(batch)
    }
}
