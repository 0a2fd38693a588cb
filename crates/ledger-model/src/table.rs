//! Column-oriented working table.

use crate::error::{ModelError, Result};
use crate::record::Record;
use crate::value::Value;

/// Ordered columns plus rows of [`Value`]s.
///
/// Every row holds exactly one cell per column; the constructors and
/// mutators enforce it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    /// Empty table with the given columns.
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table, checking that each row matches the column count.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut table = Self::new(columns);
        table.rows.reserve(rows.len());
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(ModelError::RowWidth {
                row: self.rows.len(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Values of one column, top to bottom.
    pub fn column_values(&self, name: &str) -> Option<Vec<&Value>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Insert a column at `index` holding the same value in every row.
    pub fn insert_column(
        &mut self,
        index: usize,
        name: impl Into<String>,
        value: Value,
    ) -> Result<()> {
        let name = name.into();
        if self.has_column(&name) {
            return Err(ModelError::DuplicateColumn { column: name });
        }
        if index > self.columns.len() {
            return Err(ModelError::ColumnIndex {
                index,
                width: self.columns.len(),
            });
        }
        self.columns.insert(index, name);
        for row in &mut self.rows {
            row.insert(index, value.clone());
        }
        Ok(())
    }

    /// Append a column holding the same value in every row.
    pub fn push_column(&mut self, name: impl Into<String>, value: Value) -> Result<()> {
        let index = self.columns.len();
        self.insert_column(index, name, value)
    }

    /// Rewrite every cell of a column. Returns false when the column is absent.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> bool
    where
        F: FnMut(&Value) -> Value,
    {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        true
    }

    /// Convert every row to a [`Record`], replacing NaN-like values with null.
    pub fn into_records(self) -> Vec<Record> {
        let columns = self.columns;
        self.rows
            .into_iter()
            .map(|row| {
                let mut record = Record::with_capacity(columns.len());
                for (name, value) in columns.iter().zip(row) {
                    record.insert(name.clone(), value.sanitized());
                }
                record
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Table {
        Table::from_rows(
            vec!["a".to_string(), "b".to_string()],
            vec![
                vec![Value::from("1"), Value::from("x")],
                vec![Value::from("2"), Value::from("y")],
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_rejects_ragged_row() {
        let err = Table::from_rows(vec!["a".to_string()], vec![vec![]]).unwrap_err();
        assert_eq!(
            err,
            ModelError::RowWidth {
                row: 0,
                expected: 1,
                found: 0
            }
        );
    }

    #[test]
    fn test_insert_column_uniform() {
        let mut table = sample();
        table.insert_column(0, "id", Value::from("rest-1")).unwrap();
        assert_eq!(table.columns(), &["id", "a", "b"]);
        assert!(
            table
                .column_values("id")
                .unwrap()
                .iter()
                .all(|v| v.as_str() == Some("rest-1"))
        );
    }

    #[test]
    fn test_insert_duplicate_column() {
        let mut table = sample();
        let err = table.push_column("a", Value::Null).unwrap_err();
        assert!(matches!(err, ModelError::DuplicateColumn { .. }));
    }

    #[test]
    fn test_insert_out_of_bounds() {
        let mut table = sample();
        let err = table.insert_column(5, "z", Value::Null).unwrap_err();
        assert_eq!(err, ModelError::ColumnIndex { index: 5, width: 2 });
    }

    #[test]
    fn test_map_column() {
        let mut table = sample();
        assert!(table.map_column("a", |_| Value::Integer(0)));
        assert!(!table.map_column("missing", |v| v.clone()));
        assert_eq!(
            table.column_values("a").unwrap(),
            vec![&Value::Integer(0), &Value::Integer(0)]
        );
    }

    #[test]
    fn test_into_records_sanitizes() {
        let table = Table::from_rows(
            vec!["f".to_string()],
            vec![vec![Value::Float(f64::NAN)], vec![Value::Float(2.0)]],
        )
        .unwrap();
        let records = table.into_records();
        assert_eq!(records[0].get("f"), Some(&Value::Null));
        assert_eq!(records[1].get("f"), Some(&Value::Float(2.0)));
    }
}
