use serde::{Deserialize, Serialize};

use super::figure::{Axis, Figure, FigureBody, Panel, RenderWarning, Series, SeriesStyle};
use super::{single_dataset, LabeledDataset, PlotStrategy};
use crate::color::series_color;
use crate::data::Value;
use crate::error::Result;

/// Every row as an unconnected point at `(x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scatter {
    pub x: String,
    pub y: String,
}

impl PlotStrategy for Scatter {
    fn name(&self) -> &'static str {
        "scatter"
    }

    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure> {
        let op = self.name();
        let ds = single_dataset(op, datasets)?;
        let x_values: Vec<Value> = ds.require(&self.x, op)?.values().collect();
        let y_values = ds.require_numeric(&self.y, op)?;

        let x_axis = Axis::for_values(&self.x, &x_values);
        let points = x_values
            .iter()
            .zip(y_values)
            .map(|(x, &y)| (x_axis.position(x), y))
            .collect();

        let panel = Panel {
            title: None,
            x: x_axis,
            y: Axis::continuous(&self.y),
            series: vec![Series {
                label: None,
                color: series_color(1),
                style: SeriesStyle::Points,
                points,
                support: ds.len(),
            }],
        };

        let mut warnings = Vec::new();
        if ds.is_empty() {
            warnings.push(RenderWarning::empty(op, "dataset has no rows"));
        }

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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Column, Dataset};
    use crate::error::{PlotError, SchemaErrorKind};
    use crate::plot::figure::AxisScale;
    use crate::plot::test_support::runs;

    fn scatter() -> Scatter {
        Scatter {
            x: "Isovalue".into(),
            y: "FramesPerSecond".into(),
        }
    }

    #[test]
    fn plots_every_row_without_aggregation() {
        let ds = runs(&[(0.1, 1.0, 30.0), (0.1, 1.0, 40.0), (0.2, 1.0, 50.0)]);
        let fig = scatter()
            .prepare("Bonsai", &[LabeledDataset::new("baseline", &ds)])
            .unwrap();

        let series = &fig.panels()[0].series[0];
        assert_eq!(series.style, SeriesStyle::Points);
        assert_eq!(series.points, vec![(0.1, 30.0), (0.1, 40.0), (0.2, 50.0)]);
        assert!(fig.warnings.is_empty());
    }

    #[test]
    fn missing_column_is_schema_error() {
        let ds = runs(&[(0.1, 1.0, 30.0)]);
        let strategy = Scatter {
            x: "Isovalue".into(),
            y: "TimePerFrame (ms)".into(),
        };
        match strategy.prepare("t", &[LabeledDataset::new("a", &ds)]) {
            Err(PlotError::Schema(e)) => {
                assert_eq!(e.column, "TimePerFrame (ms)");
                assert_eq!(e.operation, "scatter");
                assert_eq!(e.kind, SchemaErrorKind::Missing);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn categorical_x_uses_index_axis() {
        let ds = Dataset::new(vec![
            Column::categorical("Variant", vec!["iso".into(), "ess_d1".into()]),
            Column::numeric("FramesPerSecond", vec![10.0, 20.0]),
        ])
        .unwrap();
        let strategy = Scatter {
            x: "Variant".into(),
            y: "FramesPerSecond".into(),
        };
        let fig = strategy.prepare("t", &[LabeledDataset::new("a", &ds)]).unwrap();
        let panel = &fig.panels()[0];
        assert_eq!(
            panel.x.scale,
            AxisScale::Categorical(vec!["ess_d1".into(), "iso".into()])
        );
        assert_eq!(panel.series[0].points, vec![(1.0, 10.0), (0.0, 20.0)]);
    }

    #[test]
    fn empty_dataset_warns() {
        let ds = runs(&[]);
        let fig = scatter().prepare("t", &[LabeledDataset::new("a", &ds)]).unwrap();
        assert_eq!(fig.warnings.len(), 1);
        assert!(fig.panels()[0].series[0].points.is_empty());
    }
}
