//! In-memory loader.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use ledger_model::Batch;
use tracing::info;

use crate::error::{LoadError, Result};
use crate::loader::WarehouseLoader;
use crate::table::{LoadReceipt, TableRef};

/// Keeps every appended batch in memory.
///
/// Scripted failures (see [`MemoryLoader::with_failures`]) are returned by
/// the first calls to `append`, in order, before any batch is stored.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    appended: Mutex<Vec<(TableRef, Batch)>>,
    failures: Mutex<VecDeque<LoadError>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `failures.len()` appends with these errors.
    #[must_use]
    pub fn with_failures(self, failures: impl IntoIterator<Item = LoadError>) -> Self {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(failures);
        self
    }

    /// Snapshot of everything appended so far.
    pub fn appended(&self) -> Vec<(TableRef, Batch)> {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Total records across all appended batches.
    pub fn record_count(&self) -> usize {
        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, batch)| batch.len())
            .sum()
    }
}

impl WarehouseLoader for MemoryLoader {
    fn append(&self, batch: &Batch, destination: &TableRef) -> Result<LoadReceipt> {
        if let Some(err) = self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
        {
            return Err(err);
        }

        self.appended
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((destination.clone(), batch.clone()));
        info!(destination = %destination, rows = batch.len(), "kept batch in memory");
        Ok(LoadReceipt {
            destination: destination.clone(),
            rows: batch.len() as u64,
            job_id: None,
        })
    }
}
