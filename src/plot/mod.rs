//! Plot strategies.
//!
//! Every plot kind implements [`PlotStrategy`]: it checks its columns,
//! aggregates where it needs to and returns a backend-free [`Figure`].
//! [`PlotKind`] is the tagged request that selects one of them, and
//! [`PlotRequest::render`] runs the selected strategy and writes the artifact.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, Reduction};
use crate::data::{Dataset, Value};
use crate::error::{PlotError, Result};
use crate::render::{write_figure, RenderConfig};

pub mod comparison;
pub mod faceted;
pub mod figure;
pub mod heatmap;
pub mod line;
pub mod scatter;
pub mod scatter3d;

pub use comparison::Comparison;
pub use faceted::Faceted;
pub use figure::{Figure, FigureBody, RenderWarning};
pub use heatmap::Heatmap;
pub use line::AggregatedLine;
pub use scatter::Scatter;
pub use scatter3d::Scatter3d;

use figure::{Axis, Series, SeriesStyle};
use plotters::style::RGBColor;

// ---------------------------------------------------------------------------
// Strategy interface
// ---------------------------------------------------------------------------

/// A dataset together with the name it carries in legends.
#[derive(Debug, Clone, Copy)]
pub struct LabeledDataset<'a> {
    pub label: &'a str,
    pub dataset: &'a Dataset,
}

impl<'a> LabeledDataset<'a> {
    pub fn new(label: &'a str, dataset: &'a Dataset) -> Self {
        LabeledDataset { label, dataset }
    }
}

pub trait PlotStrategy {
    /// Operation name used in errors and warnings.
    fn name(&self) -> &'static str;

    /// Turn the input datasets into a figure. Holds no state between calls.
    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure>;
}

/// The tagged plot request: which strategy, with which columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlotKind {
    Scatter(Scatter),
    AggregatedLine(AggregatedLine),
    Heatmap(Heatmap),
    Comparison(Comparison),
    Faceted(Faceted),
    Scatter3d(Scatter3d),
}

impl PlotKind {
    pub fn strategy(&self) -> &dyn PlotStrategy {
        match self {
            PlotKind::Scatter(s) => s,
            PlotKind::AggregatedLine(s) => s,
            PlotKind::Heatmap(s) => s,
            PlotKind::Comparison(s) => s,
            PlotKind::Faceted(s) => s,
            PlotKind::Scatter3d(s) => s,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / artifact
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PlotRequest<'a> {
    pub title: String,
    pub kind: PlotKind,
    pub datasets: Vec<LabeledDataset<'a>>,
    pub output: PathBuf,
}

/// A written plot together with the figure it was drawn from.
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: PathBuf,
    pub figure: Figure,
}

impl Artifact {
    pub fn warnings(&self) -> &[RenderWarning] {
        &self.figure.warnings
    }
}

impl PlotRequest<'_> {
    pub fn prepare(&self) -> Result<Figure> {
        let strategy = self.kind.strategy();
        let figure = strategy.prepare(&self.title, &self.datasets)?;
        for warning in &figure.warnings {
            log::warn!("{} ({}): {warning}", self.output.display(), self.title);
        }
        Ok(figure)
    }

    /// Prepare the figure and write it to `self.output`.
    pub fn render(&self, config: &RenderConfig) -> Result<Artifact> {
        let figure = self.prepare()?;
        write_figure(&figure, &self.output, config)?;
        log::info!(
            "wrote {} plot to {}",
            self.kind.strategy().name(),
            self.output.display()
        );
        Ok(Artifact {
            path: self.output.clone(),
            figure,
        })
    }
}

/// Convenience wrapper for one-off renders.
pub fn render(
    kind: PlotKind,
    title: &str,
    datasets: &[LabeledDataset<'_>],
    output: &Path,
    config: &RenderConfig,
) -> Result<Artifact> {
    PlotRequest {
        title: title.to_string(),
        kind,
        datasets: datasets.to_vec(),
        output: output.to_path_buf(),
    }
    .render(config)
}

// ---------------------------------------------------------------------------
// Helpers shared by the strategies
// ---------------------------------------------------------------------------

pub(crate) fn single_dataset<'a>(
    operation: &'static str,
    datasets: &[LabeledDataset<'a>],
) -> Result<&'a Dataset> {
    match datasets {
        [only] => Ok(only.dataset),
        _ => Err(PlotError::invalid(
            operation,
            format!("expected exactly one dataset, got {}", datasets.len()),
        )),
    }
}

/// Aggregate `y` by `x` with the mean and lay the groups out on `x_axis`.
/// Groups come back in ascending x order.
pub(crate) fn mean_line(
    dataset: &Dataset,
    x: &str,
    y: &str,
    x_axis: &Axis,
    label: Option<String>,
    color: RGBColor,
) -> Result<Series> {
    let table = aggregate(dataset, &[x], y, Reduction::Mean)?;
    let points = table
        .rows
        .iter()
        .map(|row| (x_axis.position(&row.key[0]), row.value))
        .collect();
    Ok(Series {
        label,
        color,
        style: SeriesStyle::Line,
        points,
        support: table.rows.iter().map(|r| r.count).sum(),
    })
}

/// Distinct values of `column` across all datasets, for axis construction.
pub(crate) fn distinct_values(
    datasets: &[&Dataset],
    column: &str,
    operation: &str,
) -> std::result::Result<Vec<Value>, crate::error::SchemaError> {
    let mut values = Vec::new();
    for ds in datasets {
        values.extend(ds.require(column, operation)?.unique_values());
    }
    values.sort();
    values.dedup();
    Ok(values)
}
