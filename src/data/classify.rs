use std::fmt;

use serde::{Deserialize, Serialize};

use super::model::{Column, Table, Value};

/// Columns with fewer distinct values than this are always categorical.
pub const DEFAULT_CARDINALITY_THRESHOLD: usize = 10;

/// How a column is filtered and which control the UI renders for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
    Categorical,
    Numeric,
    Temporal,
    Text,
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ColumnKind::Categorical => "categorical",
            ColumnKind::Numeric => "numeric",
            ColumnKind::Temporal => "temporal",
            ColumnKind::Text => "text",
        };
        f.write_str(s)
    }
}

/// Classify a column. Precedence: low cardinality, temporal, numeric, text.
///
/// Expects the column to have been through
/// [`normalize_column`](super::normalize::normalize_column) already so that
/// date-like text is temporal.
pub fn classify(col: &Column, threshold: usize) -> ColumnKind {
    if col.n_distinct() < threshold {
        ColumnKind::Categorical
    } else if col.present().all(Value::is_temporal) {
        ColumnKind::Temporal
    } else if col.present().all(Value::is_numeric) {
        ColumnKind::Numeric
    } else {
        ColumnKind::Text
    }
}

/// Whether `col` holds values a predicate of `kind` can be evaluated on.
///
/// The classified kind of a column can change once it has been filtered
/// (fewer distinct values), so predicates are checked against the data rather
/// than the label.
pub fn supports(col: &Column, kind: ColumnKind) -> bool {
    match kind {
        ColumnKind::Categorical | ColumnKind::Text => true,
        ColumnKind::Numeric => col.present().all(Value::is_numeric),
        ColumnKind::Temporal => col.present().all(Value::is_temporal),
    }
}

// ---------------------------------------------------------------------------
// Schema – kinds inferred once per table
// ---------------------------------------------------------------------------

/// Per-column kinds, in table column order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Schema {
    fields: Vec<(String, ColumnKind)>,
}

impl Schema {
    pub fn kind(&self, column: &str) -> Option<ColumnKind> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, kind)| *kind)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, ColumnKind)> {
        self.fields.iter().map(|(name, kind)| (name.as_str(), *kind))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Classify every column of an already-normalized table.
pub fn infer_schema(table: &Table, threshold: usize) -> Schema {
    let fields = table
        .columns()
        .iter()
        .map(|col| (col.name.clone(), classify(col, threshold)))
        .collect();
    Schema { fields }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn floats(n: usize) -> Column {
        Column::new("x", (0..n).map(|i| Value::Float(i as f64)).collect())
    }

    #[test]
    fn cardinality_overrides_numeric_type() {
        assert_eq!(classify(&floats(9), 10), ColumnKind::Categorical);
        assert_eq!(classify(&floats(10), 10), ColumnKind::Numeric);
        assert_eq!(classify(&floats(11), 10), ColumnKind::Numeric);
    }

    #[test]
    fn repeated_values_count_once() {
        let ages = [5, 12, 7, 40, 5, 5, 5, 5, 5, 5];
        let col = Column::new("age", ages.iter().map(|&a| Value::Integer(a)).collect());
        assert_eq!(classify(&col, 10), ColumnKind::Categorical);
    }

    #[test]
    fn empty_column_is_categorical() {
        assert_eq!(classify(&Column::new("e", Vec::new()), 10), ColumnKind::Categorical);
    }

    #[test]
    fn temporal_beats_numeric_and_text() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let values = (0..12)
            .map(|i| Value::Timestamp((day + chrono::Days::new(i)).and_hms_opt(0, 0, 0).unwrap()))
            .collect();
        assert_eq!(classify(&Column::new("d", values), 10), ColumnKind::Temporal);
    }

    #[test]
    fn mixed_and_string_columns_are_text() {
        let mut values: Vec<Value> = (0..12).map(|i| Value::String(format!("s{i}"))).collect();
        assert_eq!(classify(&Column::new("s", values.clone()), 10), ColumnKind::Text);
        values.push(Value::Integer(1));
        assert_eq!(classify(&Column::new("s", values), 10), ColumnKind::Text);
    }

    #[test]
    fn threshold_is_configurable() {
        assert_eq!(classify(&floats(11), 20), ColumnKind::Categorical);
        assert_eq!(classify(&floats(3), 0), ColumnKind::Numeric);
    }

    #[test]
    fn supports_checks_value_types() {
        let col = floats(3);
        assert!(supports(&col, ColumnKind::Numeric));
        assert!(supports(&col, ColumnKind::Categorical));
        assert!(!supports(&col, ColumnKind::Temporal));
    }

    #[test]
    fn schema_follows_column_order() {
        let table = Table::new(vec![
            floats(12),
            Column::new("c", vec![Value::Bool(true); 12]),
        ])
        .unwrap();
        let schema = infer_schema(&table, 10);
        let kinds: Vec<_> = schema.iter().collect();
        assert_eq!(kinds, vec![("x", ColumnKind::Numeric), ("c", ColumnKind::Categorical)]);
        assert_eq!(schema.kind("missing"), None);
    }
}
