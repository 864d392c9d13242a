use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDateTime};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Value – a single cell in a column
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring common dataframe dtypes.
/// Distinct values are collected into `BTreeSet`s, so `Value` is `Ord`.
#[derive(Debug, Clone)]
pub enum Value {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Timezone-naive date-time. All temporal comparisons use this form.
    Timestamp(NaiveDateTime),
    /// Date-time still carrying its UTC offset, as read from the source file.
    TimestampTz(DateTime<FixedOffset>),
    Null,
}

// -- Manual Eq/Ord so we can put Value in BTreeSet --

/// Floats compare by total order, so a NaN cell equals itself.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use Value::*;
        fn discriminant(v: &Value) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Timestamp(_) => 5,
                TimestampTz(_) => 6,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) => a.cmp(b),
            (Timestamp(a), Timestamp(b)) => a.cmp(b),
            (TimestampTz(a), TimestampTz(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::String(s) => s.hash(state),
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Timestamp(t) => t.hash(state),
            Value::TimestampTz(t) => t.hash(state),
            Value::Null => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s}"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Value::TimestampTz(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Null => write!(f, "<null>"),
        }
    }
}

impl Value {
    /// Try to interpret the value as an `f64` for ranges and plotting.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) if !v.is_nan() => Some(*v),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// The timezone-naive date-time, if this is a temporal value.
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            Value::Timestamp(t) => Some(*t),
            Value::TimestampTz(t) => Some(t.naive_local()),
            _ => None,
        }
    }

    /// Null and NaN both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Float(v) => v.is_nan(),
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Integer(_) | Value::Float(_))
    }

    pub fn is_temporal(&self) -> bool {
        matches!(self, Value::Timestamp(_) | Value::TimestampTz(_))
    }
}

// ---------------------------------------------------------------------------
// Column – one named, ordered sequence of values
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over values that are neither null nor NaN.
    pub fn present(&self) -> impl Iterator<Item = &Value> {
        self.values.iter().filter(|v| !v.is_missing())
    }

    /// Sorted set of distinct non-missing values.
    pub fn distinct_values(&self) -> BTreeSet<Value> {
        self.present().cloned().collect()
    }

    /// Values a membership filter can pick from: the distinct values, plus
    /// `Null` standing in for every missing cell when there is one.
    pub fn choices(&self) -> BTreeSet<Value> {
        let mut choices = self.distinct_values();
        if self.values.iter().any(Value::is_missing) {
            choices.insert(Value::Null);
        }
        choices
    }

    /// Number of distinct non-missing values.
    pub fn n_distinct(&self) -> usize {
        self.present().collect::<HashSet<_>>().len()
    }

    /// `(min, max)` over the numeric values, ignoring everything else.
    pub fn numeric_bounds(&self) -> Option<(f64, f64)> {
        self.values
            .iter()
            .filter_map(Value::as_f64)
            .fold(None, |acc, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
    }

    /// `(earliest, latest)` over the temporal values.
    pub fn temporal_bounds(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        self.values
            .iter()
            .filter_map(Value::as_timestamp)
            .fold(None, |acc, t| match acc {
                None => Some((t, t)),
                Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
            })
    }
}

// ---------------------------------------------------------------------------
// Table – the complete loaded dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),
    #[error("column '{name}' has {found} rows, expected {expected}")]
    RaggedColumn {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("no column named '{0}'")]
    UnknownColumn(String),
}

/// An in-memory, column-oriented table. Filtering produces new tables and
/// never mutates its input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, checking that names are unique and lengths agree.
    pub fn new(columns: Vec<Column>) -> Result<Self, TableError> {
        let mut seen = HashSet::new();
        let expected = columns.first().map(Column::len).unwrap_or(0);
        for col in &columns {
            if !seen.insert(col.name.as_str()) {
                return Err(TableError::DuplicateColumn(col.name.clone()));
            }
            if col.len() != expected {
                return Err(TableError::RaggedColumn {
                    name: col.name.clone(),
                    expected,
                    found: col.len(),
                });
            }
        }
        Ok(Self { columns })
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.columns.first().map(Column::len).unwrap_or(0)
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub(crate) fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// New table holding only the given rows, in the given order.
    pub fn take_rows(&self, indices: &[usize]) -> Table {
        let columns = self
            .columns
            .iter()
            .map(|col| Column {
                name: col.name.clone(),
                values: indices.iter().map(|&i| col.values[i].clone()).collect(),
            })
            .collect();
        Table { columns }
    }

    /// New table holding only the named columns, in the order given.
    pub fn project<S: AsRef<str>>(&self, names: &[S]) -> Result<Table, TableError> {
        let columns = names
            .iter()
            .map(|n| {
                let n = n.as_ref();
                self.column(n)
                    .cloned()
                    .ok_or_else(|| TableError::UnknownColumn(n.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Table::new(columns)
    }

    /// Cells of one row, in column order.
    pub fn row(&self, index: usize) -> Vec<&Value> {
        self.columns.iter().map(|c| &c.values[index]).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(name: &str, vals: &[i64]) -> Column {
        Column::new(name, vals.iter().map(|&v| Value::Integer(v)).collect())
    }

    #[test]
    fn rejects_duplicate_and_ragged_columns() {
        let dup = Table::new(vec![ints("a", &[1]), ints("a", &[2])]);
        assert_eq!(dup, Err(TableError::DuplicateColumn("a".into())));

        let ragged = Table::new(vec![ints("a", &[1, 2]), ints("b", &[3])]);
        assert!(matches!(ragged, Err(TableError::RaggedColumn { found: 1, .. })));
    }

    #[test]
    fn take_rows_keeps_order_and_leaves_input_alone() {
        let table = Table::new(vec![ints("a", &[1, 2, 3, 4])]).unwrap();
        let taken = table.take_rows(&[0, 2]);
        assert_eq!(taken.column("a").unwrap().values, vec![Value::Integer(1), Value::Integer(3)]);
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn project_selects_named_columns() {
        let table = Table::new(vec![ints("a", &[1]), ints("b", &[2]), ints("c", &[3])]).unwrap();
        let projected = table.project(&["c", "a"]).unwrap();
        assert_eq!(projected.column_names(), vec!["c", "a"]);
        assert_eq!(
            table.project(&["missing"]),
            Err(TableError::UnknownColumn("missing".into()))
        );
    }

    #[test]
    fn distinct_values_ignore_missing() {
        let col = Column::new(
            "x",
            vec![
                Value::Float(1.0),
                Value::Float(f64::NAN),
                Value::Null,
                Value::Float(1.0),
                Value::Float(2.5),
            ],
        );
        assert_eq!(col.n_distinct(), 2);
        assert_eq!(col.numeric_bounds(), Some((1.0, 2.5)));
        assert_eq!(col.distinct_values().len(), 2);
        assert!(col.choices().contains(&Value::Null));
    }

    #[test]
    fn nan_cells_equal_themselves() {
        assert_eq!(Value::Float(f64::NAN), Value::Float(f64::NAN));
        assert_ne!(Value::Float(0.0), Value::Float(-0.0));
        assert_ne!(Value::Integer(5), Value::Float(5.0));
    }

    #[test]
    fn empty_table_has_no_rows() {
        let table = Table::new(Vec::new()).unwrap();
        assert!(table.is_empty());
        assert_eq!(Table::new(vec![ints("a", &[])]).unwrap().len(), 0);
    }
}
