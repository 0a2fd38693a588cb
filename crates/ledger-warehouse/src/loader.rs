use ledger_model::Batch;

use crate::error::Result;
use crate::table::{LoadReceipt, TableRef};

/// Append-only sink for record batches.
///
/// One call is one atomic load: either every record of `batch` lands in
/// `destination` or none does. Implementations never deduplicate, so calling
/// twice with the same batch stores it twice.
pub trait WarehouseLoader {
    fn append(&self, batch: &Batch, destination: &TableRef) -> Result<LoadReceipt>;
}

impl<L: WarehouseLoader + ?Sized> WarehouseLoader for &L {
    fn append(&self, batch: &Batch, destination: &TableRef) -> Result<LoadReceipt> {
        (**self).append(batch, destination)
    }
}

impl<L: WarehouseLoader + ?Sized> WarehouseLoader for Box<L> {
    fn append(&self, batch: &Batch, destination: &TableRef) -> Result<LoadReceipt> {
        (**self).append(batch, destination)
    }
}
