//! Column-wise type coercion.
//!
//! Coercion never fails on a bad cell: each kind has a fixed fallback
//! (`0`, `0.0` or null). Only an inconsistent rule set is an error.

mod date;
mod numeric;

pub use date::parse_date;
pub use numeric::{float_to_integer, parse_integer, parse_number};

use std::collections::HashMap;

use ledger_model::{Table, Value};
use tracing::{debug, info};

use crate::error::CoercionError;
use crate::rules::{CoercionRules, ColumnKind};

/// Applies [`CoercionRules`] to a table.
#[derive(Debug, Clone, Default)]
pub struct TypeCoercer {
    rules: CoercionRules,
}

impl TypeCoercer {
    pub fn new(rules: CoercionRules) -> Self {
        Self { rules }
    }

    /// Coerce every ruled column present in `table`.
    ///
    /// Columns without a rule, and rules for absent columns, are left alone.
    pub fn coerce(&self, mut table: Table) -> Result<Table, CoercionError> {
        let plan = self.plan()?;

        for (column, kind) in plan {
            let mut defaulted = 0usize;
            let present = table.map_column(column, |value| {
                let (coerced, fell_back) = coerce_value(value, kind);
                if fell_back {
                    defaulted += 1;
                }
                coerced
            });
            if present {
                info!(column, kind = %kind, rows = table.height(), "coerced column");
                debug!(column, defaulted, "cells replaced by fallback");
            }
        }

        Ok(table)
    }

    /// Rules in order, duplicates collapsed, conflicts rejected.
    fn plan(&self) -> Result<Vec<(&str, ColumnKind)>, CoercionError> {
        let mut seen: HashMap<&str, ColumnKind> = HashMap::new();
        let mut plan = Vec::with_capacity(self.rules.len());
        for (column, kind) in self.rules.iter() {
            match seen.get(column) {
                Some(first) if *first != kind => {
                    return Err(CoercionError::ConflictingRules {
                        column: column.to_string(),
                        first: *first,
                        second: kind,
                    });
                }
                Some(_) => {}
                None => {
                    seen.insert(column, kind);
                    plan.push((column, kind));
                }
            }
        }
        Ok(plan)
    }
}

/// Coerce one cell. The flag is true when the fallback was used.
fn coerce_value(value: &Value, kind: ColumnKind) -> (Value, bool) {
    let text = match value {
        Value::String(text) => text.as_str(),
        Value::Null => "",
        typed => return (typed.clone(), false),
    };
    match kind {
        ColumnKind::Integer => match parse_integer(text) {
            Some(v) => (Value::Integer(v), false),
            None => (Value::Integer(0), true),
        },
        ColumnKind::Float => match parse_number(text) {
            Some(v) => (Value::Float(v), false),
            None => (Value::Float(0.0), true),
        },
        ColumnKind::Date => match parse_date(text) {
            Some(d) => (Value::Date(d), false),
            None => (Value::Null, true),
        },
    }
}
