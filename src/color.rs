use std::collections::{BTreeMap, BTreeSet};

use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};
use plotters::style::RGBColor;

use crate::data::Value;

// ---------------------------------------------------------------------------
// Fixed series palette
// ---------------------------------------------------------------------------

/// Colors for comparison series, assigned by input position.
///
/// The first three match the historic baseline / octree depth 1 / octree
/// depth 2 plots; the rest continue with Category10.
pub const SERIES_PALETTE: &[RGBColor] = &[
    RGBColor(105, 105, 105), // dimgray
    RGBColor(65, 105, 225),  // royalblue
    RGBColor(0, 191, 255),   // deepskyblue
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(188, 189, 34),
];

/// Color of the `index`-th series. Cycles past the end of the palette.
pub fn series_color(index: usize) -> RGBColor {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<RGBColor> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.45);
            let rgb: Srgb = hsl.into_color();
            to_rgb(rgb)
        })
        .collect()
}

fn to_rgb(color: Srgb) -> RGBColor {
    let c: Srgb<u8> = color.into_format();
    RGBColor(c.red, c.green, c.blue)
}

// ---------------------------------------------------------------------------
// Color mapping: categorical value → RGBColor
// ---------------------------------------------------------------------------

/// Maps the distinct values of a chosen column to distinct colours.
#[derive(Debug, Clone)]
pub struct ColorMap {
    pub column: String,
    mapping: BTreeMap<Value, RGBColor>,
    default_color: RGBColor,
}

impl ColorMap {
    /// Build a colour map for the given column from its unique values.
    pub fn new(column: &str, unique_values: &BTreeSet<Value>) -> Self {
        let palette = generate_palette(unique_values.len());
        let mapping = unique_values.iter().cloned().zip(palette).collect();

        ColorMap {
            column: column.to_string(),
            mapping,
            default_color: RGBColor(128, 128, 128),
        }
    }

    /// Look up the colour for a given value.
    pub fn color_for(&self, value: &Value) -> RGBColor {
        self.mapping
            .get(value)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Continuous color scales
// ---------------------------------------------------------------------------

/// Viridis, sampled at ten points.
const VIRIDIS: &[(u8, u8, u8)] = &[
    (0x44, 0x01, 0x54),
    (0x48, 0x28, 0x78),
    (0x3e, 0x4a, 0x89),
    (0x31, 0x68, 0x8e),
    (0x26, 0x82, 0x8e),
    (0x1f, 0x9e, 0x89),
    (0x35, 0xb7, 0x79),
    (0x6e, 0xce, 0x58),
    (0xb5, 0xde, 0x2b),
    (0xfd, 0xe7, 0x25),
];

/// Diverging blue → grey → red ramp.
const COOLWARM: &[(u8, u8, u8)] = &[
    (59, 76, 192),
    (98, 130, 234),
    (141, 176, 254),
    (184, 208, 249),
    (221, 221, 221),
    (245, 196, 173),
    (244, 154, 123),
    (222, 96, 77),
    (180, 4, 38),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gradient {
    Viridis,
    Coolwarm,
}

impl Gradient {
    fn stops(self) -> &'static [(u8, u8, u8)] {
        match self {
            Gradient::Viridis => VIRIDIS,
            Gradient::Coolwarm => COOLWARM,
        }
    }
}

/// Maps numbers in `[min, max]` onto a gradient, interpolating in linear RGB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContinuousScale {
    pub gradient: Gradient,
    pub min: f64,
    pub max: f64,
}

impl ContinuousScale {
    /// Scale spanning the finite values of `values`. `None` when there are none.
    pub fn fit(gradient: Gradient, values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let (min, max) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;
        Some(ContinuousScale { gradient, min, max })
    }

    /// Position of `value` within the domain, clamped to `[0, 1]`.
    pub fn normalize(&self, value: f64) -> f64 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0)
    }

    pub fn color_at(&self, t: f64) -> RGBColor {
        let stops = self.gradient.stops();
        let segments = stops.len() - 1;
        let pos = t.clamp(0.0, 1.0) * segments as f64;
        let segment = (pos.floor() as usize).min(segments - 1);
        let local = (pos - segment as f64) as f32;

        let lin = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
            Srgb::new(r, g, b).into_format::<f32>().into_linear()
        };
        let mixed = lin(stops[segment]).mix(lin(stops[segment + 1]), local);
        to_rgb(Srgb::from_linear(mixed))
    }

    pub fn color_for(&self, value: f64) -> RGBColor {
        self.color_at(self.normalize(value))
    }
}
