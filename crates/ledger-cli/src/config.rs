//! Environment configuration.
//!
//! Values come from the process environment after an optional `.env` file
//! has been merged in. Everything is checked before any file is read, and a
//! missing-variable error names every absent variable at once.

use std::path::PathBuf;

use ledger_model::DEFAULT_BUSINESS_ID_COLUMN;
use ledger_warehouse::TableRef;
use thiserror::Error;

/// GCP project that owns the destination table.
pub const PROJECT_ID_VAR: &str = "GOOGLE_CLOUD_PROJECT_ID";

/// Finance dataset, optionally written as `dataset.table`.
pub const DATASET_VAR: &str = "GOOGLE_CLOUD_DATASET_FINANCE";

/// Path to a credentials JSON file.
pub const CREDENTIALS_VAR: &str = "GOOGLE_APPLICATION_CREDENTIALS";

/// Destination table when the dataset variable names only the dataset.
pub const TABLE_VAR: &str = "BIGQUERY_TABLE_STOCK_CONTROL";

/// Pre-minted OAuth access token; skips the credentials exchange.
pub const ACCESS_TOKEN_VAR: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Alternate API endpoint.
pub const API_URL_VAR: &str = "BIGQUERY_API_URL";

/// Job location.
pub const LOCATION_VAR: &str = "BIGQUERY_LOCATION";

/// Name of the business id column written into every record.
pub const BUSINESS_ID_COLUMN_VAR: &str = "LEDGER_BUSINESS_ID_COLUMN";

/// Alternate `.env` path.
pub const DOTENV_PATH_VAR: &str = "DOTENV_PATH";

/// Destination used for dry runs and local NDJSON output.
pub const LOCAL_PROJECT: &str = "local";
pub const LOCAL_DATASET: &str = "finance";
pub const LOCAL_TABLE: &str = "stock_control";

/// Configuration errors. None of these are retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variables: {}", names.join(", "))]
    MissingVariables { names: Vec<String> },

    #[error("invalid destination table '{value}': {reason}")]
    InvalidTable { value: String, reason: &'static str },

    #[error("failed to load {path}: {message}")]
    Dotenv { path: PathBuf, message: String },

    #[error("invalid business id column '{column}': {reason}")]
    InvalidBusinessIdColumn { column: String, reason: &'static str },
}

/// Merge a `.env` file into the environment.
///
/// With `DOTENV_PATH` set, that file must exist and parse. Otherwise a
/// `.env` in the current directory or a parent is used when present.
/// Variables already in the environment win.
pub fn load_dotenv() -> Result<Option<PathBuf>, ConfigError> {
    if let Some(path) = std::env::var_os(DOTENV_PATH_VAR).filter(|p| !p.is_empty()) {
        let path = PathBuf::from(path);
        dotenvy::from_path(&path).map_err(|e| ConfigError::Dotenv {
            path: path.clone(),
            message: e.to_string(),
        })?;
        return Ok(Some(path));
    }
    Ok(dotenvy::dotenv().ok())
}

/// Process environment lookup.
pub fn lookup_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

/// Name of the business id column, from the environment or the default.
pub fn business_id_column(lookup: impl Fn(&str) -> Option<String>) -> String {
    present(&lookup, BUSINESS_ID_COLUMN_VAR)
        .unwrap_or_else(|| DEFAULT_BUSINESS_ID_COLUMN.to_string())
}

/// Destination for runs that never reach the warehouse.
pub fn local_destination() -> TableRef {
    TableRef::new(LOCAL_PROJECT, LOCAL_DATASET, LOCAL_TABLE)
}

/// Settings needed to append to the warehouse.
#[derive(Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
    pub credentials_path: PathBuf,
    pub access_token: Option<String>,
    pub api_url: Option<String>,
    pub location: Option<String>,
}

impl std::fmt::Debug for WarehouseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WarehouseConfig")
            .field("project_id", &self.project_id)
            .field("dataset", &self.dataset)
            .field("table", &self.table)
            .field("credentials_path", &self.credentials_path)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("api_url", &self.api_url)
            .field("location", &self.location)
            .finish()
    }
}

impl WarehouseConfig {
    /// Read from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(lookup_env)
    }

    /// Read through an arbitrary lookup. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let project_id = present(&lookup, PROJECT_ID_VAR);
        let dataset = present(&lookup, DATASET_VAR);
        let credentials_path = present(&lookup, CREDENTIALS_VAR);
        let table_var = present(&lookup, TABLE_VAR);

        let dataset_has_table = dataset.as_deref().is_some_and(|d| d.contains('.'));
        let mut missing: Vec<String> = [
            (PROJECT_ID_VAR, project_id.is_none()),
            (DATASET_VAR, dataset.is_none()),
            (CREDENTIALS_VAR, credentials_path.is_none()),
            (TABLE_VAR, dataset.is_some() && !dataset_has_table && table_var.is_none()),
        ]
        .into_iter()
        .filter(|(_, absent)| *absent)
        .map(|(name, _)| name.to_string())
        .collect();

        let (Some(project_id), Some(dataset), Some(credentials_path)) =
            (project_id, dataset, credentials_path)
        else {
            missing.sort();
            return Err(ConfigError::MissingVariables { names: missing });
        };
        if !missing.is_empty() {
            return Err(ConfigError::MissingVariables { names: missing });
        }

        let (dataset, table) = split_destination(&dataset, table_var)?;
        Ok(Self {
            project_id,
            dataset,
            table,
            credentials_path: PathBuf::from(credentials_path),
            access_token: present(&lookup, ACCESS_TOKEN_VAR),
            api_url: present(&lookup, API_URL_VAR),
            location: present(&lookup, LOCATION_VAR),
        })
    }

    /// Fully qualified destination table.
    pub fn destination(&self) -> TableRef {
        TableRef::new(&self.project_id, &self.dataset, &self.table)
    }
}

fn present(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<String> {
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `dataset.table` wins over the separate table variable.
fn split_destination(
    dataset: &str,
    table_var: Option<String>,
) -> Result<(String, String), ConfigError> {
    let invalid = |reason| ConfigError::InvalidTable {
        value: dataset.to_string(),
        reason,
    };
    match dataset.split_once('.') {
        Some((ds, table)) => {
            if ds.is_empty() || table.is_empty() {
                return Err(invalid("expected 'dataset.table'"));
            }
            if table.contains('.') {
                return Err(invalid("too many '.' separators"));
            }
            Ok((ds.to_string(), table.to_string()))
        }
        None => table_var
            .map(|table| (dataset.to_string(), table))
            .ok_or_else(|| invalid("no table given")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_dataset_with_table() {
        let config = WarehouseConfig::from_lookup(env(&[
            (PROJECT_ID_VAR, "acme"),
            (DATASET_VAR, "finance.stock_control"),
            (CREDENTIALS_VAR, "/etc/creds.json"),
        ]))
        .unwrap();
        assert_eq!(config.destination().to_string(), "acme.finance.stock_control");
        assert!(config.access_token.is_none());
    }

    #[test]
    fn test_table_from_separate_variable() {
        let config = WarehouseConfig::from_lookup(env(&[
            (PROJECT_ID_VAR, "acme"),
            (DATASET_VAR, "finance"),
            (CREDENTIALS_VAR, "/etc/creds.json"),
            (TABLE_VAR, "stock"),
            (LOCATION_VAR, "US"),
        ]))
        .unwrap();
        assert_eq!(config.destination().to_string(), "acme.finance.stock");
        assert_eq!(config.location.as_deref(), Some("US"));
    }

    #[test]
    fn test_all_missing_names_listed() {
        let err = WarehouseConfig::from_lookup(env(&[(DATASET_VAR, "  ")])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required environment variables: GOOGLE_APPLICATION_CREDENTIALS, \
             GOOGLE_CLOUD_DATASET_FINANCE, GOOGLE_CLOUD_PROJECT_ID"
        );
    }

    #[test]
    fn test_missing_table() {
        let err = WarehouseConfig::from_lookup(env(&[
            (PROJECT_ID_VAR, "acme"),
            (DATASET_VAR, "finance"),
            (CREDENTIALS_VAR, "/etc/creds.json"),
        ]))
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingVariables { ref names } if names == &[TABLE_VAR.to_string()]
        ));
    }

    #[test]
    fn test_malformed_table() {
        let err = WarehouseConfig::from_lookup(env(&[
            (PROJECT_ID_VAR, "acme"),
            (DATASET_VAR, "finance.a.b"),
            (CREDENTIALS_VAR, "/etc/creds.json"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTable { .. }));
    }

    #[test]
    fn test_token_redacted() {
        let config = WarehouseConfig::from_lookup(env(&[
            (PROJECT_ID_VAR, "acme"),
            (DATASET_VAR, "finance.stock"),
            (CREDENTIALS_VAR, "/etc/creds.json"),
            (ACCESS_TOKEN_VAR, "ya29.secret"),
        ]))
        .unwrap();
        assert!(!format!("{config:?}").contains("ya29"));
    }

    #[test]
    fn test_business_id_column() {
        assert_eq!(business_id_column(env(&[])), "restaurant_id");
        assert_eq!(
            business_id_column(env(&[(BUSINESS_ID_COLUMN_VAR, "store_id")])),
            "store_id"
        );
    }
}
