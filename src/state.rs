use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusty_dash::config::DashboardConfig;
use rusty_dash::data::cache::TableCache;
use rusty_dash::data::filter::PreparedTable;
use rusty_dash::data::loader;
use rusty_dash::{ColumnKind, FilterEngine, FilterParams, FilterSet, Table, Value};

use crate::color::ColorMap;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    pub config: DashboardConfig,

    engine: FilterEngine,

    cache: TableCache,

    /// File the current table came from.
    pub source: Option<PathBuf>,

    /// Loaded table (None until a file loads successfully).
    pub table: Option<Arc<Table>>,

    /// Normalized copy plus inferred kinds, used to pick controls and defaults.
    pub prepared: Option<PreparedTable>,

    /// For each categorical column the sorted values offered as checkboxes.
    pub unique_values: BTreeMap<String, BTreeSet<Value>>,

    /// The user's active filters.
    pub filters: FilterSet,

    /// Last successful filter result. None means "same as `table`".
    filtered: Option<Table>,

    /// Row count of the current view.
    pub visible_rows: usize,

    /// Inline message for a rejected filter; the previous view is kept.
    pub filter_error: Option<String>,

    /// Colour maps keyed by colour column.
    pub color_maps: BTreeMap<String, ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: DashboardConfig) -> Self {
        Self {
            engine: FilterEngine::new(config.filter.clone()),
            config,
            cache: TableCache::new(),
            source: None,
            table: None,
            prepared: None,
            unique_values: BTreeMap::new(),
            filters: FilterSet::default(),
            filtered: None,
            visible_rows: 0,
            filter_error: None,
            color_maps: BTreeMap::new(),
            status_message: None,
        }
    }

    /// The table charts are drawn from: filtered if filters apply.
    pub fn view(&self) -> Option<&Table> {
        self.filtered.as_ref().or(self.table.as_deref())
    }

    /// Load `path` through the cache. On failure the previous table is
    /// dropped so nothing stale is shown.
    pub fn load_path(&mut self, path: &Path) {
        match self.cache.get_or_load(path, loader::load_file) {
            Ok(table) => {
                log::info!(
                    "Loaded {} rows with columns {:?}",
                    table.len(),
                    table.column_names()
                );
                self.source = Some(path.to_path_buf());
                self.set_table(table);
            }
            Err(e) => {
                log::error!("Failed to load file: {e:#}");
                self.clear_table();
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Drop the cached copy of the current file and read it again.
    pub fn reload(&mut self) {
        if let Some(path) = self.source.clone() {
            self.cache.invalidate(&path);
            self.load_path(&path);
        }
    }

    /// Ingest a newly loaded table, classify its columns, reset filters.
    pub fn set_table(&mut self, table: Arc<Table>) {
        let prepared = self.engine.prepare(&table);

        self.unique_values = prepared
            .schema
            .iter()
            .filter(|(_, kind)| *kind == ColumnKind::Categorical)
            .filter_map(|(name, _)| {
                let col = prepared.table.column(name)?;
                Some((name.to_string(), col.choices()))
            })
            .collect();

        self.color_maps = self
            .config
            .charts
            .iter()
            .filter_map(|chart| chart.color.clone())
            .filter_map(|col| {
                let values = prepared.table.column(&col)?.distinct_values();
                Some((col, ColorMap::new(&values)))
            })
            .collect();

        self.filters.clear();
        self.prepared = Some(prepared);
        self.table = Some(table);
        self.status_message = None;
        self.refilter();
    }

    fn clear_table(&mut self) {
        self.source = None;
        self.table = None;
        self.prepared = None;
        self.unique_values.clear();
        self.color_maps.clear();
        self.filters.clear();
        self.filtered = None;
        self.visible_rows = 0;
        self.filter_error = None;
    }

    /// Recompute the view after a filter change.
    ///
    /// A rejected filter leaves the previous view in place and reports why.
    pub fn refilter(&mut self) {
        let Some(table) = &self.table else {
            return;
        };
        match self.engine.filter(table, &self.filters) {
            Ok(outcome) => {
                self.visible_rows = outcome.row_count;
                self.filtered = match outcome.table {
                    Cow::Borrowed(_) => None,
                    Cow::Owned(t) => Some(t),
                };
                self.filter_error = None;
            }
            Err(e) => {
                log::warn!("Filter rejected: {e}");
                self.filter_error = Some(e.to_string());
            }
        }
    }

    pub fn kind_of(&self, column: &str) -> Option<ColumnKind> {
        self.prepared.as_ref()?.schema.kind(column)
    }

    /// Turn filtering on or off as a whole. Selections are dropped when off.
    pub fn set_filtering_enabled(&mut self, enabled: bool) {
        self.filters.enabled = enabled;
        if !enabled {
            self.filters.clear();
        }
        self.refilter();
    }

    /// Select or deselect a column for filtering. Newly selected columns
    /// start with parameters that keep every row.
    pub fn toggle_column(&mut self, column: &str) {
        if self.filters.deselect(column).is_none() {
            let Some(prepared) = &self.prepared else {
                return;
            };
            let (Some(col), Some(kind)) = (prepared.table.column(column), self.kind_of(column))
            else {
                return;
            };
            self.filters
                .select(column, FilterParams::defaults(col, kind));
        }
        self.refilter();
    }

    /// Replace the parameters of a selected column.
    pub fn update_params(&mut self, column: &str, params: FilterParams) {
        self.filters.select(column, params);
        self.refilter();
    }

    /// Toggle a single value in a categorical column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &Value) {
        if let Some(FilterParams::Categorical { allowed }) = self.filters.get_mut(column) {
            if !allowed.remove(value) {
                allowed.insert(value.clone());
            }
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(all_vals) = self.unique_values.get(column) {
            self.filters.select(
                column,
                FilterParams::Categorical {
                    allowed: all_vals.clone(),
                },
            );
            self.refilter();
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.select(
            column,
            FilterParams::Categorical {
                allowed: BTreeSet::new(),
            },
        );
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use rusty_dash::Column;

    use super::*;

    fn state_with(values: Vec<Value>) -> AppState {
        let mut state = AppState::new(DashboardConfig::default());
        let table = Table::new(vec![Column::new("v", values)]).unwrap();
        state.set_table(Arc::new(table));
        state
    }

    #[test]
    fn toggling_categorical_values_narrows_the_view() {
        let mut state = state_with((0..4).map(Value::Integer).collect());
        state.set_filtering_enabled(true);
        state.toggle_column("v");
        assert_eq!(state.visible_rows, 4);
        state.toggle_filter_value("v", &Value::Integer(2));
        assert_eq!(state.visible_rows, 3);
        state.select_none("v");
        assert_eq!(state.visible_rows, 0);
        state.select_all("v");
        assert_eq!(state.visible_rows, 4);
    }

    #[test]
    fn rejected_filter_keeps_previous_view() {
        let mut state = state_with((0..12).map(|i| Value::String(format!("row{i}"))).collect());
        state.set_filtering_enabled(true);
        state.toggle_column("v");
        state.update_params(
            "v",
            FilterParams::Text {
                pattern: "row1".into(),
                literal: false,
            },
        );
        assert_eq!(state.visible_rows, 3);
        state.update_params(
            "v",
            FilterParams::Text {
                pattern: "[".into(),
                literal: false,
            },
        );
        assert!(state.filter_error.is_some());
        assert_eq!(state.visible_rows, 3);
        assert_eq!(state.view().map(Table::len), Some(3));
    }

    #[test]
    fn disabling_filters_restores_full_table() {
        let mut state = state_with((0..4).map(Value::Integer).collect());
        state.set_filtering_enabled(true);
        state.toggle_column("v");
        state.select_none("v");
        state.set_filtering_enabled(false);
        assert!(state.filters.is_empty());
        assert_eq!(state.view().map(Table::len), Some(4));
    }

    #[test]
    fn load_path_reads_through_the_cache() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("ages.csv");
        std::fs::write(&path, "age\n5\n12\n7\n40\n").unwrap();

        let mut state = AppState::new(DashboardConfig::default());
        state.load_path(&path);
        assert_eq!(state.source.as_deref(), Some(path.as_path()));
        assert_eq!(state.visible_rows, 4);
        assert_eq!(state.kind_of("age"), Some(ColumnKind::Categorical));
        assert!(state.status_message.is_none());
    }

    #[test]
    fn failed_load_clears_the_table() {
        let mut state = state_with(vec![Value::Integer(1)]);
        state.load_path(Path::new("/no/such/file.csv"));
        assert!(state.table.is_none());
        assert!(state.view().is_none());
        assert!(state.status_message.is_some());
    }
}
