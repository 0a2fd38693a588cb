//! Local newline-delimited JSON output.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use ledger_model::Batch;
use tracing::info;

use crate::error::{LoadError, Result};
use crate::loader::WarehouseLoader;
use crate::table::{LoadReceipt, TableRef};

/// Appends every batch as NDJSON lines to one local file.
#[derive(Debug, Clone)]
pub struct NdjsonFileLoader {
    path: PathBuf,
}

impl NdjsonFileLoader {
    /// Append everything to `path`, creating it and its parents if needed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn io_error(path: &Path, source: std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

impl WarehouseLoader for NdjsonFileLoader {
    fn append(&self, batch: &Batch, destination: &TableRef) -> Result<LoadReceipt> {
        let path = self.path();
        // Encode first so a bad record never leaves a partial write behind
        let payload = batch.to_ndjson()?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| io_error(path, e))?;
        // Once bytes may have landed, a retry would append them again
        file.write_all(&payload)
            .and_then(|()| file.flush())
            .map_err(|source| LoadError::WriteIncomplete {
                path: path.to_path_buf(),
                source,
            })?;

        info!(
            path = %path.display(),
            destination = %destination,
            rows = batch.len(),
            "appended batch to NDJSON file"
        );
        Ok(LoadReceipt {
            destination: destination.clone(),
            rows: batch.len() as u64,
            job_id: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_model::{Record, Value};

    fn batch(id: &str) -> Batch {
        let record: Record = [("restaurant_id", Value::from(id)), ("qtd", Value::Integer(3))]
            .into_iter()
            .collect();
        Batch::new(vec![record]).unwrap()
    }

    #[test]
    fn test_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.ndjson");
        let loader = NdjsonFileLoader::new(&path);
        let table = TableRef::new("p", "d", "t");

        loader.append(&batch("a"), &table).unwrap();
        loader.append(&batch("b"), &table).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(
            text,
            "{\"restaurant_id\":\"a\",\"qtd\":3}\n{\"restaurant_id\":\"b\",\"qtd\":3}\n"
        );
    }

    #[test]
    fn test_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let loader = NdjsonFileLoader::new(dir.path().join("nested/deeper/out.ndjson"));
        let table = TableRef::new("acme", "finance", "stock_control");

        let receipt = loader.append(&batch("a"), &table).unwrap();
        assert_eq!(receipt.rows, 1);
        assert!(loader.path().is_file());
    }

    #[test]
    fn test_open_failure_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened for appending
        let loader = NdjsonFileLoader::new(dir.path());
        let table = TableRef::new("p", "d", "t");

        let err = loader.append(&batch("a"), &table).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
