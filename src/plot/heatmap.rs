use serde::{Deserialize, Serialize};

use super::figure::{Figure, FigureBody, HeatmapGrid, RenderWarning};
use super::{single_dataset, LabeledDataset, PlotStrategy};
use crate::aggregate::{aggregate, Reduction};
use crate::color::{ContinuousScale, Gradient};
use crate::data::Value;
use crate::error::Result;

fn default_metric() -> String {
    "FramesPerSecond".to_string()
}

/// Mean of `metric` for every `(row, col)` combination, drawn as a colored,
/// annotated grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heatmap {
    pub row: String,
    pub col: String,
    #[serde(default = "default_metric")]
    pub metric: String,
}

impl PlotStrategy for Heatmap {
    fn name(&self) -> &'static str {
        "heatmap"
    }

    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure> {
        let op = self.name();
        let ds = single_dataset(op, datasets)?;
        let rows: Vec<Value> = ds.require(&self.row, op)?.unique_values().into_iter().collect();
        let cols: Vec<Value> = ds.require(&self.col, op)?.unique_values().into_iter().collect();
        ds.require_numeric(&self.metric, op)?;

        let table = aggregate(
            ds,
            &[self.row.as_str(), self.col.as_str()],
            &self.metric,
            Reduction::Mean,
        )?;

        let cells: Vec<Vec<Option<f64>>> = rows
            .iter()
            .map(|r| {
                cols.iter()
                    .map(|c| table.get(&[r.clone(), c.clone()]))
                    .collect()
            })
            .collect();

        let scale = ContinuousScale::fit(
            Gradient::Coolwarm,
            cells.iter().flatten().filter_map(|c| *c),
        );

        let mut warnings = Vec::new();
        if table.is_empty() {
            warnings.push(RenderWarning::empty(op, "no cells to draw"));
        }

        let grid = HeatmapGrid {
            row_column: self.row.clone(),
            col_column: self.col.clone(),
            metric_column: self.metric.clone(),
            rows,
            cols,
            cells,
            scale,
        };
        Ok(Figure::new(title, FigureBody::Heatmap(grid)).with_warnings(warnings))
    }
}
