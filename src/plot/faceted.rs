use serde::{Deserialize, Serialize};

use super::figure::{Axis, Figure, FigureBody, Panel, RenderWarning};
use super::{mean_line, single_dataset, LabeledDataset, PlotStrategy};
use crate::color::ColorMap;
use crate::data::filter::partition;
use crate::error::Result;

fn default_x() -> String {
    "Isovalue".to_string()
}

fn default_y() -> String {
    "FramesPerSecond".to_string()
}

/// Small multiples: one stacked panel per distinct `facet` value, one mean
/// line per distinct `series` value inside each panel. All panels share the
/// x range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Faceted {
    pub facet: String,
    pub series: String,
    #[serde(default = "default_x")]
    pub x: String,
    #[serde(default = "default_y")]
    pub y: String,
}

impl Faceted {
    /// Facets over the usual Isovalue / FramesPerSecond sweep.
    pub fn new(facet: &str, series: &str) -> Self {
        Faceted {
            facet: facet.to_string(),
            series: series.to_string(),
            x: default_x(),
            y: default_y(),
        }
    }
}

impl PlotStrategy for Faceted {
    fn name(&self) -> &'static str {
        "faceted"
    }

    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure> {
        let op = self.name();
        let ds = single_dataset(op, datasets)?;
        let series_col = ds.require(&self.series, op)?;
        let x_axis = Axis::for_values(&self.x, &ds.require(&self.x, op)?.unique_values());
        ds.require_numeric(&self.y, op)?;

        let colors = ColorMap::new(&self.series, &series_col.unique_values());

        let mut panels = Vec::new();
        for facet in partition(ds, &[self.facet.as_str()], op)? {
            let subset = ds.take(&facet.rows);
            let facet_value = &facet.key[0];

            let mut lines = Vec::new();
            for group in partition(&subset, &[self.series.as_str()], op)? {
                let series_value = &group.key[0];
                lines.push(mean_line(
                    &subset.take(&group.rows),
                    &self.x,
                    &self.y,
                    &x_axis,
                    Some(format!("{}={}", self.series, series_value)),
                    colors.color_for(series_value),
                )?);
            }

            panels.push(Panel {
                title: Some(format!("{} = {}", self.facet, facet_value)),
                x: x_axis.clone(),
                y: Axis::continuous(&self.y),
                series: lines,
            });
        }

        let mut warnings = Vec::new();
        if panels.is_empty() {
            warnings.push(RenderWarning::empty(
                op,
                format!("no values of '{}' to facet on", self.facet),
            ));
        }

        Ok(Figure::new(
            title,
            FigureBody::Panels {
                panels,
                shared_x: true,
            },
        )
        .with_warnings(warnings))
    }
}
