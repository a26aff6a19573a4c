/// Data layer: typed tables, loading, filtering and partitioning.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → Dataset (column kinds fixed here)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Dataset  │  typed columns, Value accessors
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  row selection, partitioning by key columns
///   └──────────┘
/// ```
pub mod filter;
pub mod loader;
pub mod model;

pub use model::{Column, ColumnKind, Dataset, Value};
