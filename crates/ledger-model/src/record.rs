//! Enriched records and the batch handed to the warehouse.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use crate::error::{ModelError, Result};
use crate::value::Value;

/// One output row: ordered `(column, value)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            fields: Vec::with_capacity(capacity),
        }
    }

    /// Set a field, replacing an existing value in place.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        let column = column.into();
        let value = value.into();
        if let Some(field) = self.fields.iter_mut().find(|(name, _)| *name == column) {
            field.1 = value;
        } else {
            self.fields.push((column, value));
        }
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (column, value) in iter {
            record.insert(column, value);
        }
        record
    }
}

/// The records produced from one source file in one invocation.
///
/// Never empty. Not mutated once handed to a loader.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    records: Vec<Record>,
}

impl Batch {
    /// Wrap a non-empty list of records.
    pub fn new(records: Vec<Record>) -> Result<Self> {
        if records.is_empty() {
            return Err(ModelError::EmptyBatch);
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encode as newline-delimited JSON (one record per line, trailing newline).
    pub fn to_ndjson(&self) -> serde_json::Result<Vec<u8>> {
        let mut out = Vec::new();
        for record in &self.records {
            serde_json::to_writer(&mut out, record)?;
            out.push(b'\n');
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_insert_replaces() {
        let mut record = Record::new();
        record.insert("a", 1_i64);
        record.insert("b", "x");
        record.insert("a", 2_i64);
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("a"), Some(&Value::Integer(2)));
        assert_eq!(record.columns().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_empty_batch_rejected() {
        assert_eq!(Batch::new(Vec::new()), Err(ModelError::EmptyBatch));
    }

    #[test]
    fn test_ndjson_lines() {
        let records = vec![
            [("id", Value::from("r1")), ("qty", Value::Integer(3))]
                .into_iter()
                .collect(),
            [("id", Value::from("r1")), ("qty", Value::Null)]
                .into_iter()
                .collect(),
        ];
        let batch = Batch::new(records).unwrap();
        let text = String::from_utf8(batch.to_ndjson().unwrap()).unwrap();
        assert_eq!(text, "{\"id\":\"r1\",\"qty\":3}\n{\"id\":\"r1\",\"qty\":null}\n");
    }
}
