/// Data layer: core types, loading, filtering and projection.
///
/// Architecture:
/// ```text
///  .parquet / .csv / .json bytes
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse bytes → Table
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ classify  │  numeric / categorical column names
///   └──────────┘
///        │            ◄── Selection + FilterSpec (user input)
///        ▼
///   ┌──────────┐
///   │  filter   │  closed-range predicates → fresh filtered Table
///   └──────────┘
///        │
///        ▼
///   ┌────────────┐
///   │ projection │  uid + selected columns + optional color
///   └────────────┘
/// ```
///
/// [`pipeline::run`] chains filter and projection for one interaction.

pub mod classify;
pub mod error;
pub mod filter;
pub mod loader;
pub mod model;
pub mod pipeline;
pub mod projection;
