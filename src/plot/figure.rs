//! Backend-independent description of what a strategy wants drawn.
//!
//! Strategies produce a [`Figure`]; the render module turns it into pixels.
//! Keeping the two apart is what makes the aggregated numbers testable
//! without decoding images.

use std::fmt;
use std::ops::Range;

use plotters::style::RGBColor;

use crate::color::ContinuousScale;
use crate::data::Value;

// ---------------------------------------------------------------------------
// Warnings
// ---------------------------------------------------------------------------

/// Non-fatal outcome of a render whose input partition was empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    pub operation: &'static str,
    pub message: String,
}

impl RenderWarning {
    pub fn empty(operation: &'static str, message: impl Into<String>) -> Self {
        RenderWarning {
            operation,
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: empty result: {}", self.operation, self.message)
    }
}

// ---------------------------------------------------------------------------
// Axes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum AxisScale {
    Continuous,
    /// Values are placed at their index in this sorted list.
    Categorical(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub scale: AxisScale,
}

impl Axis {
    pub fn continuous(label: &str) -> Self {
        Axis {
            label: label.to_string(),
            scale: AxisScale::Continuous,
        }
    }

    /// Continuous when every value is numeric, otherwise an index axis over
    /// the sorted distinct values.
    pub fn for_values<'a>(label: &str, values: impl IntoIterator<Item = &'a Value>) -> Self {
        let values: Vec<&Value> = values.into_iter().collect();
        if values.iter().all(|v| v.is_numeric()) {
            return Axis::continuous(label);
        }
        let mut sorted: Vec<&Value> = values;
        sorted.sort();
        let mut names: Vec<String> = sorted.into_iter().map(|v| v.to_string()).collect();
        names.dedup();
        Axis {
            label: label.to_string(),
            scale: AxisScale::Categorical(names),
        }
    }

    /// Coordinate of `value` on this axis.
    pub fn position(&self, value: &Value) -> f64 {
        match (&self.scale, value) {
            (AxisScale::Continuous, Value::Numeric(v)) => *v,
            (AxisScale::Continuous, Value::Categorical(_)) => f64::NAN,
            (AxisScale::Categorical(names), v) => {
                let label = v.to_string();
                names
                    .iter()
                    .position(|n| *n == label)
                    .map_or(f64::NAN, |i| i as f64)
            }
        }
    }

    /// Tick label for coordinate `v`.
    pub fn tick_label(&self, v: f64) -> String {
        match &self.scale {
            AxisScale::Continuous => format_tick(v),
            AxisScale::Categorical(names) => {
                let idx = v.round();
                if (v - idx).abs() > 1e-6 || idx < 0.0 {
                    return String::new();
                }
                names.get(idx as usize).cloned().unwrap_or_default()
            }
        }
    }
}

pub(crate) fn format_tick(v: f64) -> String {
    let s = format!("{v:.3}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Padded range over the finite values. Falls back to a unit range when
/// nothing finite is present.
pub fn padded_range(values: impl IntoIterator<Item = f64>) -> Range<f64> {
    let bounds = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        });

    match bounds {
        None => 0.0..1.0,
        Some((lo, hi)) if (hi - lo).abs() < f64::EPSILON => (lo - 0.5)..(hi + 0.5),
        Some((lo, hi)) => {
            let pad = (hi - lo) * 0.05;
            (lo - pad)..(hi + pad)
        }
    }
}

// ---------------------------------------------------------------------------
// 2D panels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesStyle {
    /// Unconnected markers.
    Points,
    /// Markers joined by a line, broken at non-finite values.
    Line,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: Option<String>,
    pub color: RGBColor,
    pub style: SeriesStyle,
    pub points: Vec<(f64, f64)>,
    /// Number of input rows that fed this series.
    pub support: usize,
}

impl Series {
    /// Runs of consecutive finite points.
    pub fn finite_runs(&self) -> Vec<Vec<(f64, f64)>> {
        let mut runs = Vec::new();
        let mut current = Vec::new();
        for &(x, y) in &self.points {
            if x.is_finite() && y.is_finite() {
                current.push((x, y));
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub title: Option<String>,
    pub x: Axis,
    pub y: Axis,
    pub series: Vec<Series>,
}

impl Panel {
    pub fn x_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.series.iter().flat_map(|s| s.points.iter().map(|p| p.0))
    }

    pub fn y_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.series.iter().flat_map(|s| s.points.iter().map(|p| p.1))
    }

    pub fn x_range(&self) -> Range<f64> {
        axis_range(&self.x, self.x_values())
    }

    pub fn y_range(&self) -> Range<f64> {
        axis_range(&self.y, self.y_values())
    }
}

pub(crate) fn axis_range(axis: &Axis, values: impl IntoIterator<Item = f64>) -> Range<f64> {
    match &axis.scale {
        AxisScale::Categorical(names) if !names.is_empty() => -0.5..(names.len() as f64 - 0.5),
        _ => padded_range(values),
    }
}

// ---------------------------------------------------------------------------
// Heatmap grid
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapGrid {
    pub row_column: String,
    pub col_column: String,
    pub metric_column: String,
    /// Distinct row values, ascending. Row 0 is drawn at the top.
    pub rows: Vec<Value>,
    /// Distinct column values, ascending.
    pub cols: Vec<Value>,
    /// `cells[r][c]`; `None` where no input row had that combination.
    pub cells: Vec<Vec<Option<f64>>>,
    pub scale: Option<ContinuousScale>,
}

impl HeatmapGrid {
    pub fn cell(&self, row: &Value, col: &Value) -> Option<f64> {
        let r = self.rows.iter().position(|v| v == row)?;
        let c = self.cols.iter().position(|v| v == col)?;
        self.cells[r][c]
    }
}

// ---------------------------------------------------------------------------
// 3D point cloud
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PointCloud {
    pub x_label: String,
    pub y_label: String,
    pub z_label: String,
    pub color_label: String,
    /// `(x, y, z)` per input row.
    pub points: Vec<(f64, f64, f64)>,
    /// Raw color-column value per point.
    pub color_values: Vec<f64>,
    pub scale: Option<ContinuousScale>,
    /// Values printed along the color bar.
    pub color_ticks: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Figure
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum FigureBody {
    /// One or more 2D panels stacked vertically.
    Panels { panels: Vec<Panel>, shared_x: bool },
    Heatmap(HeatmapGrid),
    Scatter3d(PointCloud),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub title: String,
    pub body: FigureBody,
    pub warnings: Vec<RenderWarning>,
}

impl Figure {
    pub fn new(title: &str, body: FigureBody) -> Self {
        Figure {
            title: title.to_string(),
            body,
            warnings: Vec::new(),
        }
    }

    pub fn with_warnings(mut self, warnings: Vec<RenderWarning>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn panels(&self) -> &[Panel] {
        match &self.body {
            FigureBody::Panels { panels, .. } => panels,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finite_runs_break_at_nan() {
        let s = Series {
            label: None,
            color: RGBColor(0, 0, 0),
            style: SeriesStyle::Line,
            points: vec![(0.0, 1.0), (1.0, f64::NAN), (2.0, 3.0), (3.0, 4.0)],
            support: 4,
        };
        assert_eq!(s.finite_runs(), vec![vec![(0.0, 1.0)], vec![(2.0, 3.0), (3.0, 4.0)]]);
    }

    #[test]
    fn padded_range_fallbacks() {
        assert_eq!(padded_range(Vec::new()), 0.0..1.0);
        assert_eq!(padded_range([f64::NAN]), 0.0..1.0);
        assert_eq!(padded_range([2.0, 2.0]), 1.5..2.5);
        let r = padded_range([0.0, 10.0]);
        assert!((r.start + 0.5).abs() < 1e-12 && (r.end - 10.5).abs() < 1e-12);
    }

    #[test]
    fn categorical_axis_positions_and_ticks() {
        let values = [Value::from("iso"), Value::from("ess_d1"), Value::from("iso")];
        let axis = Axis::for_values("Variant", values.iter());
        assert_eq!(
            axis.scale,
            AxisScale::Categorical(vec!["ess_d1".into(), "iso".into()])
        );
        assert_eq!(axis.position(&Value::from("iso")), 1.0);
        assert_eq!(axis.tick_label(0.0), "ess_d1");
        assert_eq!(axis.tick_label(0.5), "");
        assert_eq!(axis_range(&axis, Vec::new()), -0.5..1.5);
    }

    #[test]
    fn numeric_axis_is_continuous() {
        let values = [Value::from(0.1), Value::from(0.2)];
        let axis = Axis::for_values("Isovalue", values.iter());
        assert_eq!(axis.scale, AxisScale::Continuous);
        assert_eq!(axis.position(&Value::from(0.2)), 0.2);
        assert_eq!(axis.tick_label(0.25), "0.25");
        assert_eq!(axis.tick_label(2.0), "2");
    }
}
