/// Data layer: core types, loading, and filtering.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Table   (cache: one entry per file version)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  normalize    │  date-like text → timestamps, offsets stripped
///   └──────────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  classify     │  Schema: one ColumnKind per column
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSet → predicates, AND-combined → filtered Table
///   └──────────┘
/// ```

pub mod cache;
pub mod classify;
pub mod filter;
pub mod loader;
pub mod model;
pub mod normalize;
pub mod predicate;
