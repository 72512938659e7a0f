//! Interactive parallel-coordinates explorer for tabular data.
//!
//! The data layer ([`data`]) loads a file into a [`data::model::Table`],
//! filters it by per-column numeric ranges and reshapes the survivors into a
//! [`data::projection::Projection`] that the renderers ([`render`], [`ui`])
//! draw.  [`state::AppState`] owns one session and re-runs the pipeline on
//! every interaction.

pub mod app;
pub mod color;
pub mod config;
pub mod data;
pub mod render;
pub mod state;
pub mod ui;
