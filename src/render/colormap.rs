//! Color maps for colorizing field values.

use std::ops::Range;

use itertools::{izip, Itertools, MinMaxResult};

/// 8-bit sRGB color with alpha.
pub type Color = [u8; 4];
pub const LUT_SIZE: usize = 256;

pub const DEFAULT_COLOR_MAP: &str = "viridis";

/// A map determining how to colorize data, stored as a lookup table.
#[derive(Clone, Debug)]
pub struct ColorMap {
    pub name: String,
    lut: [Color; LUT_SIZE],
}

impl ColorMap {
    /// Create a color map from an [`enterpolation`] curve
    /// interpolating [`palette`] colors.
    pub fn from_curve<Curve, C>(name: impl Into<String>, curve: Curve) -> Self
    where
        C: palette::IntoColor<palette::Srgb>,
        Curve: enterpolation::Curve<f32, Output = C>,
    {
        let vals = curve.take(LUT_SIZE);
        let mut lut = [[0; 4]; LUT_SIZE];
        for (color, lut_val) in izip!(vals, lut.iter_mut()) {
            let c: palette::Srgb = color.into_color();
            let as_u8 = |channel: f32| (u8::MAX as f32 * channel.clamp(0.0, 1.0)).round() as u8;
            *lut_val = [as_u8(c.red), as_u8(c.green), as_u8(c.blue), u8::MAX];
        }
        Self {
            name: name.into(),
            lut,
        }
    }

    /// Color at `t` in `0..=1`. Values outside are clamped, NaN maps to the
    /// low end.
    pub fn sample(&self, t: f32) -> Color {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        self.lut[(t * (LUT_SIZE - 1) as f32).round() as usize]
    }

    /// Color for `value` within `range`. A degenerate range maps everything
    /// to the middle of the map.
    pub fn map(&self, value: f32, range: &Range<f32>) -> Color {
        let width = range.end - range.start;
        if width.abs() <= f32::EPSILON {
            return self.sample(0.5);
        }
        self.sample((value - range.start) / width)
    }
}

/// Min..max of the finite values, or `-1..1` when there are fewer than two.
pub fn value_range(values: &[f32]) -> Range<f32> {
    match values.iter().filter(|v| v.is_finite()).minmax() {
        MinMaxResult::NoElements | MinMaxResult::OneElement(_) => -1.0..1.0,
        MinMaxResult::MinMax(&l, &u) => l..u,
    }
}

pub mod builtin {
    //! Premade color maps: [`viridis`], [`coolwarm`], [`sunset`].

    use super::ColorMap;
    use enterpolation::linear::ConstEquidistantLinear;
    use palette::{FromColor, Oklab, Srgb};

    /// sRGB hex code in 0xRRGGBB format to Oklab, for uniform gradients.
    fn srgb_hex(val: u32) -> Oklab {
        let srgb_u8 = Srgb::from(val);
        let srgb_float: Srgb<f32> = srgb_u8.into_format();
        Oklab::from_color(srgb_float)
    }

    fn linear_equidistant<const COUNT: usize>(name: &str, colors: [Oklab; COUNT]) -> ColorMap {
        ColorMap::from_curve(name, ConstEquidistantLinear::equidistant_unchecked(colors))
    }

    pub fn all() -> Vec<ColorMap> {
        vec![viridis(), coolwarm(), sunset()]
    }

    /// Look a map up by name, case-insensitively.
    pub fn by_name(name: &str) -> Option<ColorMap> {
        all().into_iter().find(|m| m.name.eq_ignore_ascii_case(name))
    }

    pub fn viridis() -> ColorMap {
        linear_equidistant(
            "viridis",
            [
                srgb_hex(0x440154),
                srgb_hex(0x3b528b),
                srgb_hex(0x21918c),
                srgb_hex(0x5ec962),
                srgb_hex(0xfde725),
            ],
        )
    }

    /// Diverging blue to red, for signed quantities.
    pub fn coolwarm() -> ColorMap {
        linear_equidistant(
            "coolwarm",
            [srgb_hex(0x3b4cc0), srgb_hex(0xdddddd), srgb_hex(0xb40426)],
        )
    }

    pub fn sunset() -> ColorMap {
        linear_equidistant(
            "sunset",
            [srgb_hex(0x000d33), srgb_hex(0xb31a33), srgb_hex(0xf2e64d)],
        )
    }
}
