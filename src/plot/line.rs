use serde::{Deserialize, Serialize};

use super::figure::{Axis, Figure, FigureBody, Panel, RenderWarning};
use super::{mean_line, single_dataset, LabeledDataset, PlotStrategy};
use crate::aggregate::Reduction;
use crate::color::series_color;
use crate::error::Result;

/// Mean of `y` per distinct `x`, joined in ascending `x` order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedLine {
    pub x: String,
    pub y: String,
}

impl PlotStrategy for AggregatedLine {
    fn name(&self) -> &'static str {
        "aggregated_line"
    }

    fn prepare(&self, title: &str, datasets: &[LabeledDataset<'_>]) -> Result<Figure> {
        let op = self.name();
        let ds = single_dataset(op, datasets)?;
        let x_axis = Axis::for_values(&self.x, &ds.require(&self.x, op)?.unique_values());
        ds.require_numeric(&self.y, op)?;

        let series = mean_line(
            ds,
            &self.x,
            &self.y,
            &x_axis,
            Some(format!("{} {}", Reduction::Mean.label(), self.y)),
            series_color(1),
        )?;

        let mut warnings = Vec::new();
        if series.points.is_empty() {
            warnings.push(RenderWarning::empty(op, "no groups to plot"));
        }

        let panel = Panel {
            title: None,
            x: x_axis,
            y: Axis::continuous(&self.y),
            series: vec![series],
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::figure::SeriesStyle;
    use crate::plot::test_support::runs;

    fn line() -> AggregatedLine {
        AggregatedLine {
            x: "Isovalue".into(),
            y: "FramesPerSecond".into(),
        }
    }

    #[test]
    fn means_per_isovalue_ascending() {
        let ds = runs(&[(0.2, 1.0, 50.0), (0.1, 1.0, 30.0), (0.1, 2.0, 40.0)]);
        let fig = line().prepare("Bonsai", &[LabeledDataset::new("a", &ds)]).unwrap();

        let series = &fig.panels()[0].series[0];
        assert_eq!(series.style, SeriesStyle::Line);
        assert_eq!(series.points, vec![(0.1, 35.0), (0.2, 50.0)]);
        assert_eq!(series.label.as_deref(), Some("Mean FramesPerSecond"));
        assert_eq!(series.support, 3);
    }

    #[test]
    fn non_numeric_metric_is_rejected() {
        let ds = runs(&[(0.1, 1.0, 30.0)]);
        let strategy = AggregatedLine {
            x: "Isovalue".into(),
            y: "Nope".into(),
        };
        match strategy.prepare("t", &[LabeledDataset::new("a", &ds)]) {
            Err(crate::error::PlotError::Schema(e)) => {
                assert_eq!(e.column, "Nope");
                assert_eq!(e.operation, "aggregated_line");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn empty_dataset_warns_instead_of_failing() {
        let ds = runs(&[]);
        let fig = line().prepare("t", &[LabeledDataset::new("a", &ds)]).unwrap();
        assert_eq!(fig.warnings.len(), 1);
        assert_eq!(fig.warnings[0].operation, "aggregated_line");
    }
}
