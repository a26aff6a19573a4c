use std::sync::OnceLock;

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color::ContinuousScale;
use crate::error::{render_err, PlotError, Result};
use crate::plot::figure::{
    axis_range, format_tick, padded_range, AxisScale, HeatmapGrid, Panel, PointCloud, SeriesStyle,
};
use crate::plot::{Figure, FigureBody};

const FONT: &str = "sans-serif";
const COLOR_BAR_WIDTH: u32 = 160;
const MISSING: RGBColor = RGBColor(128, 128, 128);

/// DejaVu Sans, shipped with the crate so bitmap text never depends on the
/// fonts installed on the host.
static DEJAVU_SANS: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Register the bundled face under [`FONT`]. Only the first call does any work.
fn register_fonts() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let ok = *REGISTERED.get_or_init(|| {
        let ok = register_font(FONT, FontStyle::Normal, DEJAVU_SANS).is_ok();
        log::debug!("registered bundled '{FONT}' font: {ok}");
        ok
    });
    if ok {
        Ok(())
    } else {
        Err(PlotError::Render(format!(
            "bundled '{FONT}' font could not be parsed"
        )))
    }
}

/// Draw `figure` onto `root`. Works with any plotters backend.
pub fn draw_figure<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, figure: &Figure) -> Result<()> {
    register_fonts()?;
    root.fill(&WHITE).map_err(render_err)?;
    let body = root.titled(&figure.title, (FONT, 28)).map_err(render_err)?;
    match &figure.body {
        FigureBody::Panels { panels, shared_x } => draw_panels(&body, panels, *shared_x),
        FigureBody::Heatmap(grid) => draw_heatmap(&body, grid),
        FigureBody::Scatter3d(cloud) => draw_cloud(&body, cloud),
    }
}

fn draw_placeholder<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, text: &str) -> Result<()> {
    let (w, h) = area.dim_in_pixel();
    let style = (FONT, 20)
        .into_font()
        .color(&MISSING)
        .pos(Pos::new(HPos::Center, VPos::Center));
    area.draw(&Text::new(text.to_string(), (w as i32 / 2, h as i32 / 2), style))
        .map_err(render_err)
}

// ---------------------------------------------------------------------------
// 2D panels
// ---------------------------------------------------------------------------

fn draw_panels<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panels: &[Panel],
    shared_x: bool,
) -> Result<()> {
    if panels.is_empty() {
        return draw_placeholder(area, "no data");
    }

    let shared = shared_x.then(|| axis_range(&panels[0].x, panels.iter().flat_map(|p| p.x_values())));
    let areas = area.split_evenly((panels.len(), 1));
    for (panel, sub) in panels.iter().zip(&areas) {
        draw_panel(sub, panel, shared.clone())?;
    }
    Ok(())
}

fn draw_panel<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    panel: &Panel,
    x_range: Option<std::ops::Range<f64>>,
) -> Result<()> {
    let x_range = x_range.unwrap_or_else(|| panel.x_range());
    let mut builder = ChartBuilder::on(area);
    builder.margin(10).x_label_area_size(45).y_label_area_size(70);
    if let Some(title) = &panel.title {
        builder.caption(title, (FONT, 20));
    }
    let mut chart = builder
        .build_cartesian_2d(x_range, panel.y_range())
        .map_err(render_err)?;

    let x_fmt = |v: &f64| panel.x.tick_label(*v);
    let y_fmt = |v: &f64| format_tick(*v);
    let mut mesh = chart.configure_mesh();
    mesh.x_desc(panel.x.label.as_str())
        .y_desc(panel.y.label.as_str())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt);
    if let AxisScale::Categorical(names) = &panel.x.scale {
        mesh.x_labels(names.len() * 2 + 1).disable_x_mesh();
    }
    mesh.draw().map_err(render_err)?;

    for series in &panel.series {
        let color = series.color;
        if series.style == SeriesStyle::Line {
            for run in series.finite_runs() {
                chart
                    .draw_series(LineSeries::new(run, color.stroke_width(2)))
                    .map_err(render_err)?;
            }
        }
        let markers = chart
            .draw_series(
                series
                    .points
                    .iter()
                    .filter(|(x, y)| x.is_finite() && y.is_finite())
                    .map(|&p| Circle::new(p, 4, color.filled())),
            )
            .map_err(render_err)?;
        if let Some(label) = &series.label {
            markers.label(label.as_str()).legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
        }
    }

    if panel.series.iter().any(|s| s.label.is_some()) {
        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperRight)
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_err)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Heatmap
// ---------------------------------------------------------------------------

fn draw_heatmap<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, grid: &HeatmapGrid) -> Result<()> {
    let Some(scale) = grid.scale.filter(|_| !grid.rows.is_empty() && !grid.cols.is_empty()) else {
        return draw_placeholder(area, "no data");
    };

    let (width, _) = area.dim_in_pixel();
    let (grid_area, bar_area) = area.split_horizontally(width.saturating_sub(COLOR_BAR_WIDTH));
    let n_rows = grid.rows.len();
    let n_cols = grid.cols.len();

    let mut chart = ChartBuilder::on(&grid_area)
        .margin(10)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d((0..n_cols).into_segmented(), (0..n_rows).into_segmented())
        .map_err(render_err)?;

    // Row 0 sits at the top, so segment r holds row n_rows - 1 - r.
    let x_fmt = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(c) => grid.cols.get(*c).map(|v| v.to_string()).unwrap_or_default(),
        _ => String::new(),
    };
    let y_fmt = |v: &SegmentValue<usize>| match v {
        SegmentValue::CenterOf(r) if *r < n_rows => grid.rows[n_rows - 1 - r].to_string(),
        _ => String::new(),
    };
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n_cols)
        .y_labels(n_rows)
        .x_desc(grid.col_column.as_str())
        .y_desc(grid.row_column.as_str())
        .x_label_formatter(&x_fmt)
        .y_label_formatter(&y_fmt)
        .draw()
        .map_err(render_err)?;

    let cells = grid.cells.iter().enumerate().flat_map(|(r, row)| {
        row.iter().enumerate().filter_map(move |(c, cell)| {
            cell.filter(|v| v.is_finite())
                .map(|v| (n_rows - 1 - r, c, v))
        })
    });
    for (y, x, v) in cells {
        let fill = scale.color_for(v);
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [
                    (SegmentValue::Exact(x), SegmentValue::Exact(y)),
                    (SegmentValue::Exact(x + 1), SegmentValue::Exact(y + 1)),
                ],
                fill.filled(),
            )))
            .map_err(render_err)?;

        let ink = if luminance(fill) > 0.5 { BLACK } else { WHITE };
        let style = (FONT, 14)
            .into_font()
            .color(&ink)
            .pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(std::iter::once(Text::new(
                format!("{v:.2}"),
                (SegmentValue::CenterOf(x), SegmentValue::CenterOf(y)),
                style,
            )))
            .map_err(render_err)?;
    }

    draw_color_bar(&bar_area, &scale, &grid.metric_column, &even_ticks(&scale, 5))
}

fn luminance(c: RGBColor) -> f64 {
    (0.299 * c.0 as f64 + 0.587 * c.1 as f64 + 0.114 * c.2 as f64) / 255.0
}

fn even_ticks(scale: &ContinuousScale, n: usize) -> Vec<f64> {
    if (scale.max - scale.min).abs() < f64::EPSILON {
        return vec![scale.min];
    }
    (0..n)
        .map(|i| scale.min + (scale.max - scale.min) * i as f64 / (n - 1) as f64)
        .collect()
}

/// Vertical gradient strip with tick labels on its right edge.
fn draw_color_bar<DB: DrawingBackend>(
    area: &DrawingArea<DB, Shift>,
    scale: &ContinuousScale,
    label: &str,
    ticks: &[f64],
) -> Result<()> {
    const STEPS: i32 = 100;
    let (_, height) = area.dim_in_pixel();
    let (top, bottom) = (60, height as i32 - 60);
    let (left, right) = (20, 50);
    let span = (bottom - top).max(1);

    for i in 0..STEPS {
        let y0 = bottom - span * i / STEPS;
        let y1 = bottom - span * (i + 1) / STEPS;
        let t = (i as f64 + 0.5) / STEPS as f64;
        area.draw(&Rectangle::new([(left, y1), (right, y0)], scale.color_at(t).filled()))
            .map_err(render_err)?;
    }
    area.draw(&Rectangle::new([(left, top), (right, bottom)], BLACK.stroke_width(1)))
        .map_err(render_err)?;

    let tick_style = (FONT, 14)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Left, VPos::Center));
    for &tick in ticks {
        let y = bottom - (scale.normalize(tick) * span as f64).round() as i32;
        area.draw(&PathElement::new(vec![(right, y), (right + 5, y)], BLACK))
            .map_err(render_err)?;
        area.draw(&Text::new(format_tick(tick), (right + 8, y), tick_style.clone()))
            .map_err(render_err)?;
    }

    let label_style = (FONT, 16).into_font().color(&BLACK);
    area.draw(&Text::new(label.to_string(), (left, top - 30), label_style))
        .map_err(render_err)
}

// ---------------------------------------------------------------------------
// 3D scatter
// ---------------------------------------------------------------------------

fn draw_cloud<DB: DrawingBackend>(area: &DrawingArea<DB, Shift>, cloud: &PointCloud) -> Result<()> {
    let Some(scale) = cloud.scale.filter(|_| !cloud.points.is_empty()) else {
        return draw_placeholder(area, "no data");
    };

    let (width, _) = area.dim_in_pixel();
    let (plot_area, bar_area) = area.split_horizontally(width.saturating_sub(COLOR_BAR_WIDTH));
    let (plot_area, legend_area) = plot_area.split_vertically(plot_area.dim_in_pixel().1.saturating_sub(30));

    let x_range = padded_range(cloud.points.iter().map(|p| p.0));
    let y_range = padded_range(cloud.points.iter().map(|p| p.1));
    let z_range = padded_range(cloud.points.iter().map(|p| p.2));

    // plotters' second axis is the vertical one, so z goes there.
    let mut chart = ChartBuilder::on(&plot_area)
        .margin(20)
        .build_cartesian_3d(x_range, z_range, y_range)
        .map_err(render_err)?;
    chart.with_projection(|mut pb| {
        pb.yaw = 0.6;
        pb.pitch = 0.35;
        pb.scale = 0.8;
        pb.into_matrix()
    });
    chart
        .configure_axes()
        .light_grid_style(BLACK.mix(0.15))
        .max_light_lines(3)
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(
            cloud
                .points
                .iter()
                .zip(&cloud.color_values)
                .filter(|((x, y, z), _)| x.is_finite() && y.is_finite() && z.is_finite())
                .map(|(&(x, y, z), &c)| {
                    let fill = if c.is_finite() { scale.color_for(c) } else { MISSING };
                    Circle::new((x, z, y), 4, fill.filled())
                }),
        )
        .map_err(render_err)?;

    let axes = format!(
        "x: {}    depth: {}    vertical: {}",
        cloud.x_label, cloud.y_label, cloud.z_label
    );
    let (lw, lh) = legend_area.dim_in_pixel();
    let style = (FONT, 16)
        .into_font()
        .color(&BLACK)
        .pos(Pos::new(HPos::Center, VPos::Center));
    legend_area
        .draw(&Text::new(axes, (lw as i32 / 2, lh as i32 / 2), style))
        .map_err(render_err)?;

    draw_color_bar(&bar_area, &scale, &cloud.color_label, &cloud.color_ticks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Gradient;

    #[test]
    fn even_ticks_span_the_scale() {
        let scale = ContinuousScale {
            gradient: Gradient::Coolwarm,
            min: 10.0,
            max: 50.0,
        };
        assert_eq!(even_ticks(&scale, 5), vec![10.0, 20.0, 30.0, 40.0, 50.0]);

        let flat = ContinuousScale { min: 3.0, max: 3.0, ..scale };
        assert_eq!(even_ticks(&flat, 5), vec![3.0]);
    }

    #[test]
    fn annotation_ink_contrasts_with_fill() {
        assert!(luminance(RGBColor(255, 255, 255)) > 0.5);
        assert!(luminance(RGBColor(59, 76, 192)) < 0.5);
    }
}
