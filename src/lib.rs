//! Tabular data dashboard core: load a table, infer a filter control for
//! every column, and narrow the table with composable per-column filters.

pub mod config;
pub mod data;
pub mod viz;

pub use data::classify::{ColumnKind, Schema};
pub use data::filter::{FilterConfig, FilterEngine, FilterError, FilterOutcome, FilterSet, FilterSpec};
pub use data::loader::LoadError;
pub use data::model::{Column, Table, TableError, Value};
pub use data::predicate::FilterParams;
