/// Data layer: core types, loading, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Dataset (once per session)
///   └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │   Dataset     │  Vec<Record>, regions, numeric columns, date range
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  FilterSelection → visible indices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ summary   │  per-region stats, latest values, correlation
///   └──────────┘
/// ```

pub mod filter;
pub mod indicators;
pub mod loader;
pub mod model;
pub mod summary;
