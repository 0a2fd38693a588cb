//! Which columns get coerced, and to what.

use std::fmt;

/// Target type of a coerced column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    /// Whole number; unparseable or blank cells become `0`.
    Integer,
    /// Floating point; unparseable or blank cells become `0.0`.
    Float,
    /// Calendar date; unparseable or blank cells become null.
    Date,
}

impl ColumnKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Date => "date",
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered list of `(normalized column, kind)` pairs.
///
/// The default set covers the stock-control export:
/// `qtd_usada_unidades` (integer), `custo_unitario_brl` (float) and
/// `data` (date).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionRules {
    rules: Vec<(String, ColumnKind)>,
}

impl Default for CoercionRules {
    fn default() -> Self {
        Self::empty()
            .with_rule("qtd_usada_unidades", ColumnKind::Integer)
            .with_rule("custo_unitario_brl", ColumnKind::Float)
            .with_rule("data", ColumnKind::Date)
    }
}

impl CoercionRules {
    /// No rules; every column stays text.
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    #[must_use]
    pub fn with_rule(mut self, column: impl Into<String>, kind: ColumnKind) -> Self {
        self.rules.push((column.into(), kind));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.rules.iter().map(|(column, kind)| (column.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules() {
        let defaults = CoercionRules::default();
        let rules: Vec<_> = defaults.iter().collect();
        assert_eq!(
            rules,
            vec![
                ("qtd_usada_unidades", ColumnKind::Integer),
                ("custo_unitario_brl", ColumnKind::Float),
                ("data", ColumnKind::Date),
            ]
        );
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ColumnKind::Float.to_string(), "float");
    }
}
