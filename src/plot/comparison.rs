use serde::{Deserialize, Serialize};

use super::figure::{Axis, Figure, FigureBody, Panel, RenderWarning, Series, SeriesStyle};
use super::{distinct_values, mean_line, LabeledDataset, PlotStrategy};
use crate::aggregate::Reduction;
use crate::color::series_color;
use crate::data::Dataset;
use crate::error::{PlotError, Result};

fn aggregate_by_default() -> bool {
    true
}

/// One line per input dataset on a shared coordinate system.
///
/// With `aggregate` set, each dataset is reduced to the mean of `y` per `x`
/// on its own; datasets are never aligned against each other, so a series
/// only spans the x values its dataset has. Without it, raw rows are joined
/// in data order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub x: String,
    pub y: String,
    #[serde(default = "aggregate_by_default")]
    pub aggregate: bool,
}

impl PlotStrategy for Comparison {
    fn name(&self) -> &'static str {
        "comparison"
    }

    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure> {
        let op = self.name();
        if datasets.len() < 2 {
            return Err(PlotError::invalid(
                op,
                format!("needs at least two datasets, got {}", datasets.len()),
            ));
        }

        let all: Vec<&Dataset> = datasets.iter().map(|d| d.dataset).collect();
        for ds in &all {
            ds.require_numeric(&self.y, op)?;
        }
        let x_axis = Axis::for_values(&self.x, &distinct_values(&all, &self.x, op)?);

        let mut series = Vec::with_capacity(datasets.len());
        let mut warnings = Vec::new();
        for (i, input) in datasets.iter().enumerate() {
            let s = if self.aggregate {
                mean_line(
                    input.dataset,
                    &self.x,
                    &self.y,
                    &x_axis,
                    Some(format!("{} {}, {}", Reduction::Mean.label(), self.y, input.label)),
                    series_color(i),
                )?
            } else {
                self.raw_line(input, &x_axis, i)?
            };
            if s.points.is_empty() {
                warnings.push(RenderWarning::empty(
                    op,
                    format!("dataset '{}' has no rows", input.label),
                ));
            }
            series.push(s);
        }

        let panel = Panel {
            title: None,
            x: x_axis,
            y: Axis::continuous(&self.y),
            series,
        };
        Ok(Figure::new(
            title,
            FigureBody::Panels {
                panels: vec![panel],
                shared_x: false,
            },
        )
        .with_warnings(warnings))
    }
}

impl Comparison {
    fn raw_line(&self, input: &LabeledDataset<'_>, x_axis: &Axis, index: usize) -> Result<Series> {
        let op = self.name();
        let xs = input.dataset.require(&self.x, op)?;
        let ys = input.dataset.require_numeric(&self.y, op)?;
        Ok(Series {
            label: Some(format!("{}, {}", self.y, input.label)),
            color: series_color(index),
            style: SeriesStyle::Line,
            points: xs
                .values()
                .zip(ys)
                .map(|(x, &y)| (x_axis.position(&x), y))
                .collect(),
            support: input.dataset.len(),
        })
    }
}
