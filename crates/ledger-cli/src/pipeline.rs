//! Ingestion pipeline orchestration.
//!
//! One call to [`run_ingest`] takes one CSV file through every stage:
//!
//! 1. input access check (never retried)
//! 2. CSV read
//! 3. header normalization
//! 4. record building (coercion, business id, audit columns)
//! 5. schema validation
//! 6. append to the warehouse
//!
//! Stages 2-6 each run under the configured [`RetryPolicy`]. The batch is
//! validated in full before the append, so a failed run writes nothing.

use std::path::Path;

use ledger_common::{RetryPolicy, Retryable};
use ledger_ingest::{
    HeaderCollisionPolicy, IngestError, NormalizationError, check_input_access,
    normalize_header, normalize_headers, read_csv_table,
};
use ledger_model::{AUDIT_COLUMNS, DEFAULT_BUSINESS_ID_COLUMN};
use ledger_transform::{BuildError, CoercionRules, RecordBuilder, TypeCoercer};
use ledger_validate::{ExpectedSchema, SchemaError, validate_batch};
use ledger_warehouse::{
    BigQueryLoader, CredentialsFile, LoadError, LoadReceipt, StaticToken, TableRef, TokenSource,
    WarehouseLoader, bigquery,
};
use thiserror::Error;
use tracing::{info, info_span};

use crate::config::{ConfigError, WarehouseConfig};

/// Any failure that ends a run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Normalization(#[from] NormalizationError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl Retryable for PipelineError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Ingest(e) => e.is_retryable(),
            Self::Normalization(e) => e.is_retryable(),
            Self::Build(e) => e.is_retryable(),
            Self::Schema(e) => e.is_retryable(),
            Self::Load(e) => e.is_retryable(),
            Self::Config(_) => false,
        }
    }
}

/// Knobs for a single run.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub collision_policy: HeaderCollisionPolicy,
    pub business_id_column: String,
    pub retry: RetryPolicy,
    pub coercion_rules: CoercionRules,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            collision_policy: HeaderCollisionPolicy::default(),
            business_id_column: DEFAULT_BUSINESS_ID_COLUMN.to_string(),
            retry: RetryPolicy::default(),
            coercion_rules: CoercionRules::default(),
        }
    }
}

impl PipelineOptions {
    /// Check the business id column before any file is read.
    ///
    /// It must already be a normalized header, and it cannot share a name
    /// with an audit column or a typed column.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let column = self.business_id_column.as_str();
        let invalid = |reason| ConfigError::InvalidBusinessIdColumn {
            column: column.to_string(),
            reason,
        };
        if column.is_empty() {
            return Err(invalid("name is empty"));
        }
        if normalize_header(column) != column {
            return Err(invalid("name must be lowercase ASCII letters, digits and '_'"));
        }
        if AUDIT_COLUMNS.contains(&column) {
            return Err(invalid("name is reserved for an audit column"));
        }
        if self.coercion_rules.iter().any(|(typed, _)| typed == column) {
            return Err(invalid("name is a typed column"));
        }
        Ok(())
    }
}

/// Run the full pipeline for one file and append the result.
pub fn run_ingest(
    csv_path: &Path,
    business_id: &str,
    destination: &TableRef,
    loader: &dyn WarehouseLoader,
    options: &PipelineOptions,
) -> Result<LoadReceipt, PipelineError> {
    let span = info_span!("ingest", path = %csv_path.display(), business_id);
    let _guard = span.enter();
    let retry = options.retry;

    options.validate()?;
    check_input_access(csv_path)?;

    let raw = retry.run("read csv", || read_csv_table(csv_path))?;

    let reserved: Vec<&str> = std::iter::once(options.business_id_column.as_str())
        .chain(AUDIT_COLUMNS)
        .collect();
    let headers = retry.run("normalize headers", || {
        normalize_headers(&raw.headers, &reserved, options.collision_policy)
    })?;
    let table = raw.into_table(&headers)?;

    let builder = RecordBuilder::new(TypeCoercer::new(options.coercion_rules.clone()))
        .with_retry_policy(retry)
        .with_business_id_column(options.business_id_column.as_str());
    let batch = retry.run("build records", || {
        builder.build(table.clone(), business_id, &headers)
    })?;

    let schema = ExpectedSchema::for_business_id(&options.business_id_column);
    retry.run("validate schema", || validate_batch(&batch, &schema))?;

    let receipt = retry.run("append batch", || loader.append(&batch, destination))?;
    info!(
        destination = %receipt.destination,
        rows = receipt.rows,
        "batch appended"
    );
    Ok(receipt)
}

/// Build a BigQuery loader from warehouse settings.
///
/// An explicit access token takes precedence over the credentials file.
pub fn connect_bigquery(config: &WarehouseConfig) -> Result<BigQueryLoader, PipelineError> {
    let client = bigquery::http_client()?;
    let tokens: Box<dyn TokenSource> = match &config.access_token {
        Some(token) => Box::new(StaticToken::new(token.as_str())),
        None => Box::new(CredentialsFile::load(
            &config.credentials_path,
            client.clone(),
        )?),
    };

    let mut loader = BigQueryLoader::new(client, tokens);
    if let Some(url) = &config.api_url {
        loader = loader.with_api_url(url.as_str());
    }
    if let Some(location) = &config.location {
        loader = loader.with_location(location.as_str());
    }
    Ok(loader)
}
