//! Comparative plots for volume-rendering benchmark runs.
//!
//! ```text
//!   eval.csv ──► data::loader ──► Dataset ──► filter ──► PlotStrategy::prepare ──► Figure
//!                                                                                   │
//!                                                         render::write_figure ◄────┘
//!                                                                 │
//!                                                            .png / .svg
//! ```
//!
//! Strategies only ever see columns through [`Dataset::require`] and
//! [`Dataset::require_numeric`], so a missing or mistyped column surfaces as a
//! [`SchemaError`] naming both the column and the plot that asked for it.

pub mod aggregate;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod pipeline;
pub mod plot;
pub mod render;

pub use aggregate::{aggregate, AggregatedRow, AggregatedTable, Reduction};
pub use data::{Column, ColumnKind, Dataset, Value};
pub use error::{DatasetError, PlotError, SchemaError, SchemaErrorKind};
pub use plot::{
    AggregatedLine, Artifact, Comparison, Faceted, Figure, Heatmap, LabeledDataset, PlotKind,
    PlotRequest, PlotStrategy, RenderWarning, Scatter, Scatter3d,
};
pub use render::RenderConfig;
