use std::collections::BTreeSet;

use ledger_model::{Batch, Record};
use tracing::debug;

use crate::error::SchemaError;
use crate::schema::ExpectedSchema;

/// Check that every record holds the required columns and that all records
/// share the first record's column set.
///
/// Missing columns are collected across the whole batch before failing.
pub fn validate_batch(batch: &Batch, schema: &ExpectedSchema) -> Result<(), SchemaError> {
    let mut missing = BTreeSet::new();
    for record in batch {
        for column in schema.required() {
            if !record.contains(column) {
                missing.insert(column.to_string());
            }
        }
    }
    if !missing.is_empty() {
        return Err(SchemaError::MissingColumns {
            columns: missing.into_iter().collect(),
        });
    }

    if let Some((first, rest)) = batch.records().split_first() {
        let expected = column_set(first);
        for (offset, record) in rest.iter().enumerate() {
            if column_set(record) != expected {
                return Err(SchemaError::ColumnMismatch { index: offset + 1 });
            }
        }
    }

    debug!(records = batch.len(), "batch schema valid");
    Ok(())
}

fn column_set(record: &Record) -> BTreeSet<&str> {
    record.columns().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_model::{Record, Value};

    fn record(columns: &[&str]) -> Record {
        columns
            .iter()
            .map(|column| (*column, Value::from("x")))
            .collect()
    }

    const FULL: &[&str] = &[
        "restaurant_id",
        "data",
        "created_at",
        "updated_at",
        "original_headers",
    ];

    #[test]
    fn test_valid_batch() {
        let batch = Batch::new(vec![record(FULL), record(FULL)]).unwrap();
        assert_eq!(validate_batch(&batch, &ExpectedSchema::default()), Ok(()));
    }

    #[test]
    fn test_missing_business_id_named_exactly() {
        let batch = Batch::new(vec![record(&FULL[1..])]).unwrap();
        assert_eq!(
            validate_batch(&batch, &ExpectedSchema::default()),
            Err(SchemaError::MissingColumns {
                columns: vec!["restaurant_id".to_string()]
            })
        );
    }

    #[test]
    fn test_missing_collected_across_records() {
        let batch = Batch::new(vec![
            record(&["restaurant_id", "created_at", "original_headers"]),
            record(&["created_at", "updated_at", "original_headers"]),
        ])
        .unwrap();
        let err = validate_batch(&batch, &ExpectedSchema::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "missing required columns: restaurant_id, updated_at"
        );
    }

    #[test]
    fn test_extra_columns_allowed() {
        let mut columns = FULL.to_vec();
        columns.push("observacao");
        let batch = Batch::new(vec![record(&columns)]).unwrap();
        assert!(validate_batch(&batch, &ExpectedSchema::default()).is_ok());
    }

    #[test]
    fn test_column_mismatch() {
        let mut wider = FULL.to_vec();
        wider.push("item");
        let batch = Batch::new(vec![record(FULL), record(FULL), record(&wider)]).unwrap();
        assert_eq!(
            validate_batch(&batch, &ExpectedSchema::default()),
            Err(SchemaError::ColumnMismatch { index: 2 })
        );
    }
}
