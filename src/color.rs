use std::collections::{BTreeMap, BTreeSet};

use eframe::egui::Color32;
use palette::{Hsl, IntoColor, LinSrgb, Mix, Srgb};

// ---------------------------------------------------------------------------
// Color palette generator
// ---------------------------------------------------------------------------

/// Generates `n` visually distinct colours using evenly spaced hues.
pub fn generate_palette(n: usize) -> Vec<Color32> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let hue = (i as f32 / n as f32) * 360.0;
            let hsl = Hsl::new(hue, 0.75, 0.55);
            let rgb: Srgb = hsl.into_color();
            let rgb: Srgb<u8> = rgb.into_format();
            Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Categorical mapping: region → Color32
// ---------------------------------------------------------------------------

/// Assigns each region a stable, distinct colour. Built from the full region
/// set so colours do not shift when the filter changes.
#[derive(Debug, Clone)]
pub struct ColorMap {
    mapping: BTreeMap<String, Color32>,
    default_color: Color32,
}

impl ColorMap {
    pub fn new(regions: &BTreeSet<String>) -> Self {
        let mapping = regions
            .iter()
            .cloned()
            .zip(generate_palette(regions.len()))
            .collect();
        ColorMap {
            mapping,
            default_color: Color32::GRAY,
        }
    }

    pub fn color_for(&self, region: &str) -> Color32 {
        self.mapping
            .get(region)
            .copied()
            .unwrap_or(self.default_color)
    }
}

// ---------------------------------------------------------------------------
// Sequential ramp for the choropleth
// ---------------------------------------------------------------------------

/// ColorBrewer YlOrRd, 9 classes.
const YL_OR_RD: [(u8, u8, u8); 9] = [
    (0xff, 0xff, 0xcc),
    (0xff, 0xed, 0xa0),
    (0xfe, 0xd9, 0x76),
    (0xfe, 0xb2, 0x4c),
    (0xfd, 0x8d, 0x3c),
    (0xfc, 0x4e, 0x2a),
    (0xe3, 0x1a, 0x1c),
    (0xbd, 0x00, 0x26),
    (0x80, 0x00, 0x26),
];

/// Fill for regions with no value.
pub const NO_DATA: Color32 = Color32::GRAY;

/// Maps values in `[min, max]` onto the YlOrRd ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SequentialRamp {
    pub min: f64,
    pub max: f64,
}

impl SequentialRamp {
    /// Ramp spanning the finite values, `None` when there are none.
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<Self>, v| {
                Some(match acc {
                    None => Self { min: v, max: v },
                    Some(r) => Self {
                        min: r.min.min(v),
                        max: r.max.max(v),
                    },
                })
            })
    }

    /// Position of `value` in `[0, 1]`. A degenerate range maps to the middle.
    pub fn normalize(&self, value: f64) -> f32 {
        let span = self.max - self.min;
        if span.abs() < f64::EPSILON {
            return 0.5;
        }
        ((value - self.min) / span).clamp(0.0, 1.0) as f32
    }

    pub fn color_for(&self, value: Option<f64>) -> Color32 {
        match value {
            Some(v) if v.is_finite() => ramp_color(self.normalize(v)),
            _ => NO_DATA,
        }
    }

    /// `n` evenly spaced (value, colour) pairs for a legend.
    pub fn legend_stops(&self, n: usize) -> Vec<(f64, Color32)> {
        let n = n.max(2);
        (0..n)
            .map(|i| {
                let t = i as f64 / (n - 1) as f64;
                let v = self.min + t * (self.max - self.min);
                (v, ramp_color(t as f32))
            })
            .collect()
    }
}

/// Interpolate the ramp at `t ∈ [0, 1]` in linear RGB.
pub fn ramp_color(t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let scaled = t * (YL_OR_RD.len() - 1) as f32;
    let lo = (scaled.floor() as usize).min(YL_OR_RD.len() - 2);
    let frac = scaled - lo as f32;

    let to_linear = |(r, g, b): (u8, u8, u8)| -> LinSrgb {
        Srgb::new(r, g, b).into_format::<f32>().into_linear()
    };
    let mixed = to_linear(YL_OR_RD[lo]).mix(to_linear(YL_OR_RD[lo + 1]), frac);
    let rgb: Srgb<u8> = Srgb::from_linear(mixed);
    Color32::from_rgb(rgb.red, rgb.green, rgb.blue)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_distinct_colours() {
        let p = generate_palette(16);
        assert_eq!(p.len(), 16);
        let unique: BTreeSet<_> = p.iter().map(|c| c.to_array()).collect();
        assert_eq!(unique.len(), 16);
    }

    #[test]
    fn region_colours_are_stable() {
        let regions: BTreeSet<String> = ["Ashanti", "Volta"].iter().map(|s| s.to_string()).collect();
        let a = ColorMap::new(&regions);
        let b = ColorMap::new(&regions);
        assert_eq!(a.color_for("Volta"), b.color_for("Volta"));
        assert_ne!(a.color_for("Volta"), a.color_for("Ashanti"));
        assert_eq!(a.color_for("Oti"), Color32::GRAY);
    }

    fn close(a: Color32, b: Color32) -> bool {
        a.to_array()
            .iter()
            .zip(b.to_array())
            .all(|(x, y)| x.abs_diff(y) <= 1)
    }

    #[test]
    fn ramp_endpoints() {
        assert!(close(ramp_color(0.0), Color32::from_rgb(0xff, 0xff, 0xcc)));
        assert!(close(ramp_color(1.0), Color32::from_rgb(0x80, 0x00, 0x26)));
        assert!(close(ramp_color(-3.0), ramp_color(0.0)));
    }

    #[test]
    fn ramp_from_values_ignores_nan() {
        let r = SequentialRamp::from_values([2.0, f64::NAN, 10.0, 6.0]).unwrap();
        assert_eq!((r.min, r.max), (2.0, 10.0));
        assert_eq!(r.normalize(6.0), 0.5);
        assert_eq!(r.color_for(None), NO_DATA);
        assert!(SequentialRamp::from_values(std::iter::empty()).is_none());
    }

    #[test]
    fn degenerate_ramp_maps_to_middle() {
        let r = SequentialRamp { min: 3.0, max: 3.0 };
        assert_eq!(r.normalize(3.0), 0.5);
        assert_eq!(r.legend_stops(5).len(), 5);
    }
}
