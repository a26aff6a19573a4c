use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::figure::{Figure, FigureBody, PointCloud, RenderWarning};
use super::{single_dataset, LabeledDataset, PlotStrategy};
use crate::color::{ContinuousScale, Gradient};
use crate::data::Value;
use crate::error::Result;

/// Color bars list every distinct value up to this many.
const MAX_DISCRETE_TICKS: usize = 10;

/// One point per row in `(x, y, z)`, colored by `color` on a viridis scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scatter3d {
    pub x: String,
    pub y: String,
    pub z: String,
    pub color: String,
}

impl PlotStrategy for Scatter3d {
    fn name(&self) -> &'static str {
        "scatter3d"
    }

    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure> {
        let op = self.name();
        let ds = single_dataset(op, datasets)?;
        let xs = ds.require_numeric(&self.x, op)?;
        let ys = ds.require_numeric(&self.y, op)?;
        let zs = ds.require_numeric(&self.z, op)?;
        let cs = ds.require_numeric(&self.color, op)?;

        let points = xs
            .iter()
            .zip(ys)
            .zip(zs)
            .map(|((&x, &y), &z)| (x, y, z))
            .collect();
        let scale = ContinuousScale::fit(Gradient::Viridis, cs.iter().copied());

        let mut warnings = Vec::new();
        if ds.is_empty() {
            warnings.push(RenderWarning::empty(op, "dataset has no rows"));
        }

        let cloud = PointCloud {
            x_label: self.x.clone(),
            y_label: self.y.clone(),
            z_label: self.z.clone(),
            color_label: self.color.clone(),
            points,
            color_values: cs.to_vec(),
            color_ticks: color_ticks(cs, scale.as_ref()),
            scale,
        };
        Ok(Figure::new(title, FigureBody::Scatter3d(cloud)).with_warnings(warnings))
    }
}

/// Distinct finite values when there are few of them, else five evenly
/// spaced values across the scale.
fn color_ticks(values: &[f64], scale: Option<&ContinuousScale>) -> Vec<f64> {
    let Some(scale) = scale else {
        return Vec::new();
    };
    let distinct: BTreeSet<Value> = values
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| Value::Numeric(v))
        .collect();
    if distinct.len() <= MAX_DISCRETE_TICKS {
        return distinct.iter().filter_map(Value::as_f64).collect();
    }
    (0..5)
        .map(|i| scale.min + (scale.max - scale.min) * i as f64 / 4.0)
        .collect()
}
