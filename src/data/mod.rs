/// Data layer: discovery, schema inference, loading and time alignment.
///
/// Architecture:
/// ```text
///   root folder
///        │
///        ▼
///   ┌──────────┐
///   │ catalog  │  walk → Vec<DataFile>, name filter
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  schema  │  sample rows → numeric / time column choices
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  tab-delimited text → TableCache + per-file errors
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │   time   │  time column → elapsed seconds
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter  │  TimeWindow → included rows
///   └──────────┘
/// ```

pub mod catalog;
pub mod filter;
pub mod loader;
pub mod model;
pub mod schema;
pub mod time;
