use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classify::{self, ColumnKind, Schema, DEFAULT_CARDINALITY_THRESHOLD};
use super::model::Table;
use super::normalize::{self, DEFAULT_DATE_FORMAT};
use super::predicate::{self, FilterParams};

// ---------------------------------------------------------------------------
// Errors surfaced to the caller of the engine
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid pattern '{pattern}' for column '{column}': {source}")]
    InvalidPattern {
        column: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid range for column '{column}': {lo} is after {hi}")]
    InvalidRange { column: String, lo: String, hi: String },
    #[error("no column named '{0}'")]
    UnknownColumn(String),
    #[error("column '{column}' holds {actual} values, cannot apply a {requested} filter")]
    KindMismatch {
        column: String,
        actual: ColumnKind,
        requested: ColumnKind,
    },
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Columns with fewer distinct values are filtered by membership.
    pub cardinality_threshold: usize,
    /// `chrono` pattern text columns are parsed against.
    pub date_format: String,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            cardinality_threshold: DEFAULT_CARDINALITY_THRESHOLD,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// FilterSpec / FilterSet – the user's current selections
// ---------------------------------------------------------------------------

/// One active filter on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub column: String,
    pub params: FilterParams,
}

impl FilterSpec {
    pub fn kind(&self) -> ColumnKind {
        self.params.kind()
    }
}

/// The active filters, in the order the user picked them. Order is kept for
/// display only; it never changes the result.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterSet {
    /// Master switch. When off the engine passes tables through untouched.
    pub enabled: bool,
    specs: Vec<FilterSpec>,
}

impl FilterSet {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            specs: Vec::new(),
        }
    }

    /// Start filtering `column`. Re-selecting a column replaces its
    /// parameters but keeps its position.
    pub fn select(&mut self, column: impl Into<String>, params: FilterParams) {
        let column = column.into();
        match self.get_mut(&column) {
            Some(existing) => *existing = params,
            None => self.specs.push(FilterSpec { column, params }),
        }
    }

    /// Builder form of [`select`](Self::select).
    pub fn with(mut self, column: impl Into<String>, params: FilterParams) -> Self {
        self.select(column, params);
        self
    }

    /// Stop filtering `column`, dropping its parameters.
    pub fn deselect(&mut self, column: &str) -> Option<FilterSpec> {
        let idx = self.specs.iter().position(|s| s.column == column)?;
        Some(self.specs.remove(idx))
    }

    pub fn get(&self, column: &str) -> Option<&FilterParams> {
        self.specs
            .iter()
            .find(|s| s.column == column)
            .map(|s| &s.params)
    }

    pub fn get_mut(&mut self, column: &str) -> Option<&mut FilterParams> {
        self.specs
            .iter_mut()
            .find(|s| s.column == column)
            .map(|s| &mut s.params)
    }

    pub fn is_selected(&self, column: &str) -> bool {
        self.get(column).is_some()
    }

    pub fn specs(&self) -> &[FilterSpec] {
        &self.specs
    }

    pub fn columns(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.column.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.specs.clear();
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// A normalized copy of a table together with its inferred kinds.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub table: Table,
    pub schema: Schema,
}

/// Result of one engine run.
#[derive(Debug, Clone)]
pub struct FilterOutcome<'a> {
    /// Borrowed when filtering is disabled, owned otherwise.
    pub table: Cow<'a, Table>,
    pub row_count: usize,
}

impl FilterOutcome<'_> {
    pub fn into_owned(self) -> Table {
        self.table.into_owned()
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterEngine {
    config: FilterConfig,
}

impl FilterEngine {
    pub fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Copy `table`, normalize every column, and classify each one.
    ///
    /// The UI uses this to pick a control and its defaults for every column,
    /// selected or not.
    pub fn prepare(&self, table: &Table) -> PreparedTable {
        let mut table = table.clone();
        normalize::normalize_table(&mut table, &self.config.date_format);
        let schema = classify::infer_schema(&table, self.config.cardinality_threshold);
        PreparedTable { table, schema }
    }

    /// Apply `filters` to `table`.
    ///
    /// With filtering disabled the input is handed back as-is. Otherwise every
    /// predicate is built before any row is dropped, so a bad parameter on
    /// any column fails the whole call and no partial result escapes.
    ///
    /// The rows returned are the rows of `table`, not their normalized form.
    pub fn filter<'a>(
        &self,
        table: &'a Table,
        filters: &FilterSet,
    ) -> Result<FilterOutcome<'a>, FilterError> {
        if !filters.enabled {
            return Ok(FilterOutcome {
                row_count: table.len(),
                table: Cow::Borrowed(table),
            });
        }

        let prepared = self.prepare(table);
        let filtered = self.apply(table, &prepared, filters)?;
        let row_count = filtered.len();
        log::debug!(
            "{} of {} rows pass {} filter(s)",
            row_count,
            table.len(),
            filters.len()
        );
        Ok(FilterOutcome {
            table: Cow::Owned(filtered),
            row_count,
        })
    }

    /// AND-combine the predicates of `filters` and keep the matching rows of
    /// `source`. `prepared` must come from [`prepare`](Self::prepare) on
    /// `source`.
    ///
    /// A cell passes when either its loaded value or its normalized reading
    /// does. Normalization is all-or-nothing per column, so a subset of rows
    /// can normalize where the whole table did not; checking both forms keeps
    /// re-filtering a filtered table from dropping further rows.
    pub fn apply(
        &self,
        source: &Table,
        prepared: &PreparedTable,
        filters: &FilterSet,
    ) -> Result<Table, FilterError> {
        let table = &prepared.table;

        let mut bound = Vec::with_capacity(filters.len());
        for spec in filters.specs() {
            let idx = table
                .column_index(&spec.column)
                .ok_or_else(|| FilterError::UnknownColumn(spec.column.clone()))?;
            let col = &table.columns()[idx];
            let actual = prepared
                .schema
                .kind(&spec.column)
                .unwrap_or_else(|| classify::classify(col, self.config.cardinality_threshold));

            if !classify::supports(col, spec.kind()) {
                return Err(FilterError::KindMismatch {
                    column: spec.column.clone(),
                    actual,
                    requested: spec.kind(),
                });
            }
            if let Some(pred) = predicate::build(col, &spec.params)? {
                log::trace!("filter on '{}' ({actual}) active", spec.column);
                bound.push((idx, pred));
            }
        }

        let mut keep = vec![true; table.len()];
        for (idx, pred) in &bound {
            let normalized = &table.columns()[*idx].values;
            let loaded = &source.columns()[*idx].values;
            for (row, flag) in keep.iter_mut().enumerate() {
                if *flag && !pred.matches(&normalized[row]) && !pred.matches(&loaded[row]) {
                    *flag = false;
                }
            }
        }

        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter(|(_, k)| **k)
            .map(|(i, _)| i)
            .collect();
        Ok(source.take_rows(&indices))
    }
}
