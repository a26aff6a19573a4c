//! Turning a [`Figure`] into a file on disk.
//!
//! ```text
//!   Figure ──► draw::draw_figure(&DrawingArea) ──► SVG string ──► fs::write
//!                                               └► RGB buffer ──► image::save_buffer
//! ```
//!
//! The drawing area lives only for the duration of one call and is dropped
//! before anything touches the filesystem, so concurrent renders never share
//! backend state.

use std::fs;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{render_err, PlotError, Result};
use crate::plot::{Figure, FigureBody};

mod draw;

pub use draw::draw_figure;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Canvas dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    /// Height of each stacked facet; faceted figures grow with their facet count.
    pub facet_height: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            width: 1600,
            height: 900,
            facet_height: 300,
        }
    }
}

impl RenderConfig {
    /// Pixel size for `figure`.
    pub fn canvas_size(&self, figure: &Figure) -> (u32, u32) {
        match &figure.body {
            FigureBody::Panels {
                panels,
                shared_x: true,
            } if !panels.is_empty() => (self.width, self.facet_height * panels.len() as u32),
            _ => (self.width, self.height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Png,
    Svg,
}

impl OutputFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("png") => Ok(OutputFormat::Png),
            Some("svg") => Ok(OutputFormat::Svg),
            _ => Err(PlotError::invalid(
                "render",
                format!(
                    "unsupported output '{}': expected a .png or .svg path",
                    path.display()
                ),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

/// Draw `figure` into an SVG document.
pub fn render_svg(figure: &Figure, size: (u32, u32)) -> Result<String> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().map_err(render_err)?;
    }
    Ok(svg)
}

/// Draw `figure` into a packed RGB8 buffer of `size.0 * size.1` pixels.
pub fn render_rgb(figure: &Figure, size: (u32, u32)) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; size.0 as usize * size.1 as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        draw_figure(&root, figure)?;
        root.present().map_err(render_err)?;
    }
    Ok(buffer)
}

/// Render `figure` to `path`, picking the backend from the extension and
/// creating missing parent directories.
pub fn write_figure(figure: &Figure, path: &Path, config: &RenderConfig) -> Result<()> {
    let format = OutputFormat::from_path(path)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let size = config.canvas_size(figure);
    match format {
        OutputFormat::Svg => {
            let svg = render_svg(figure, size)?;
            fs::write(path, svg).map_err(io_err(path))?;
        }
        OutputFormat::Png => {
            let buffer = render_rgb(figure, size)?;
            image::save_buffer(path, &buffer, size.0, size.1, image::ExtendedColorType::Rgb8)
                .map_err(|e| match e {
                    image::ImageError::IoError(source) => PlotError::Io {
                        path: path.to_path_buf(),
                        source,
                    },
                    other => render_err(other),
                })?;
        }
    }
    log::debug!("{} is {}x{} ({:?})", path.display(), size.0, size.1, format);
    Ok(())
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> PlotError {
    let path: PathBuf = path.to_path_buf();
    move |source| PlotError::Io { path, source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plot::figure::{Axis, Panel};

    fn stacked(n: usize) -> Figure {
        let panel = Panel {
            title: None,
            x: Axis::continuous("Isovalue"),
            y: Axis::continuous("FramesPerSecond"),
            series: Vec::new(),
        };
        Figure::new(
            "Isosurface timings",
            FigureBody::Panels {
                panels: vec![panel; n],
                shared_x: true,
            },
        )
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            OutputFormat::from_path(Path::new("out/a.PNG")).unwrap(),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::from_path(Path::new("a.svg")).unwrap(),
            OutputFormat::Svg
        );
        assert!(matches!(
            OutputFormat::from_path(Path::new("a.pdf")),
            Err(PlotError::InvalidRequest { .. })
        ));
        assert!(OutputFormat::from_path(Path::new("noext")).is_err());
    }

    #[test]
    fn faceted_canvas_grows_with_facets() {
        let config = RenderConfig::default();
        assert_eq!(config.canvas_size(&stacked(3)), (1600, 900));
        assert_eq!(config.canvas_size(&stacked(5)), (1600, 1500));
        assert_eq!(config.canvas_size(&stacked(0)), (1600, 900));
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config: RenderConfig = serde_json::from_str(r#"{"width": 800}"#).unwrap();
        assert_eq!(
            config,
            RenderConfig {
                width: 800,
                ..RenderConfig::default()
            }
        );
    }

    #[test]
    fn svg_contains_title() {
        let svg = render_svg(&stacked(1), (400, 300)).unwrap();
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("Isosurface timings"));
    }

    #[test]
    fn rgb_buffer_has_white_background() {
        let buffer = render_rgb(&stacked(1), (320, 240)).unwrap();
        assert_eq!(buffer.len(), 320 * 240 * 3);
        assert_eq!(&buffer[..3], &[255, 255, 255]);
    }

    #[test]
    fn rgb_title_is_rasterized() {
        let (w, h) = (400, 300);
        let buffer = render_rgb(&stacked(1), (w, h)).unwrap();
        let title_strip = &buffer[..w as usize * 24 * 3];
        let ink = title_strip
            .chunks_exact(3)
            .filter(|px| px.iter().all(|&c| c < 128))
            .count();
        assert!(ink > 20, "only {ink} dark pixels in the title strip");
    }
}
