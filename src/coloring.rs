//! Conversion of map data into RGBA colors.

use crate::label::LabelTable;
use crate::palette::{Palette, PaletteColorMapping, PaletteScaleMode};
use crate::stats::{FastStatistics, ZERO_TOLERANCE};
use rgb::RGBA;

const TRANSPARENT: RGBA<f32> = RGBA {
    r: 0.,
    g: 0.,
    b: 0.,
    a: 0.,
};

/// Bounds of the positive and negative bands normalized to `[0, 1]`
/// and `[-1, 0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleBounds {
    /// Mapped to `1`.
    pub most_positive: f32,
    /// Mapped to `0` on the positive side.
    pub least_positive: f32,
    /// Mapped to `0` on the negative side.
    pub least_negative: f32,
    /// Mapped to `-1`.
    pub most_negative: f32,
}

impl ScaleBounds {
    /// Resolve the bounds of a scale mode against the data's statistics.
    pub fn resolve(mode: PaletteScaleMode, stats: &FastStatistics) -> Self {
        match mode {
            PaletteScaleMode::Auto => ScaleBounds {
                most_positive: stats.most_positive_value(),
                least_positive: 0.,
                least_negative: 0.,
                most_negative: stats.most_negative_value(),
            },
            PaletteScaleMode::AutoPercentage {
                least_positive,
                most_positive,
                least_negative,
                most_negative,
            } => ScaleBounds {
                most_positive: stats.approximate_positive_percentile(most_positive),
                least_positive: stats.approximate_positive_percentile(least_positive),
                least_negative: stats.approximate_negative_percentile(least_negative),
                most_negative: stats.approximate_negative_percentile(most_negative),
            },
            PaletteScaleMode::User {
                least_positive,
                most_positive,
                least_negative,
                most_negative,
            } => ScaleBounds {
                most_positive,
                least_positive,
                least_negative,
                most_negative,
            },
        }
    }

    /// Normalize a value into `[-1, 1]`. Zero maps to zero.
    pub fn normalize(&self, value: f32) -> f32 {
        if value.abs() <= ZERO_TOLERANCE {
            0.
        } else if value > 0. {
            let span = self.most_positive - self.least_positive;
            if span > 0. {
                ((value - self.least_positive) / span).max(0.).min(1.)
            } else {
                1.
            }
        } else {
            let span = self.least_negative - self.most_negative;
            if span > 0. {
                -((self.least_negative - value) / span).max(0.).min(1.)
            } else {
                -1.
            }
        }
    }
}

/// Color scalar data with a palette.
///
/// `stats` must describe `data`; it resolves automatic scale bounds.
/// Values whose sign is not displayed, and non-finite values, become
/// fully transparent.
pub fn color_scalars_with_palette(
    stats: &FastStatistics,
    mapping: &PaletteColorMapping,
    palette: &Palette,
    data: &[f32],
    rgba: &mut [RGBA<f32>],
) {
    debug_assert_eq!(data.len(), rgba.len());
    let bounds = ScaleBounds::resolve(mapping.scale_mode(), stats);
    let interpolate = mapping.is_interpolate_colors();
    for (value, out) in data.iter().zip(rgba.iter_mut()) {
        let value = *value;
        let shown = if !value.is_finite() {
            false
        } else if value.abs() <= ZERO_TOLERANCE {
            mapping.is_display_zero()
        } else if value > 0. {
            mapping.is_display_positive()
        } else {
            mapping.is_display_negative()
        };
        *out = if shown {
            palette.color(bounds.normalize(value), interpolate)
        } else {
            TRANSPARENT
        };
    }
}

/// Color label keys with a label table. Keys absent from the table
/// become fully transparent.
pub fn color_indices_with_label_table(
    table: &LabelTable,
    data: &[f32],
    rgba: &mut [RGBA<f32>],
) {
    debug_assert_eq!(data.len(), rgba.len());
    for (value, out) in data.iter().zip(rgba.iter_mut()) {
        *out = table
            .label(*value as i32)
            .map(|l| l.color())
            .unwrap_or(TRANSPARENT);
    }
}

/// Fill a buffer with transparent black.
pub fn clear(rgba: &mut [RGBA<f32>]) {
    for c in rgba.iter_mut() {
        *c = TRANSPARENT;
    }
}

/// Convert a color with components in `[0, 1]` to bytes.
pub fn to_rgba8(c: RGBA<f32>) -> RGBA<u8> {
    let byte = |v: f32| (v.max(0.).min(1.) * 255.) as u8;
    RGBA::new(byte(c.r), byte(c.g), byte(c.b), byte(c.a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::Label;
    use crate::palette::PaletteFile;

    #[test]
    fn user_scale() {
        let bounds = ScaleBounds {
            most_positive: 1.,
            least_positive: 0.,
            least_negative: 0.,
            most_negative: -2.,
        };
        assert_eq!(bounds.normalize(0.75), 0.75);
        assert_eq!(bounds.normalize(3.), 1.);
        assert_eq!(bounds.normalize(-1.), -0.5);
        assert_eq!(bounds.normalize(0.), 0.);
    }

    #[test]
    fn palette_coloring() {
        let palettes = PaletteFile::with_default_palettes();
        let palette = palettes.palette_by_name("Gray_Interp").unwrap();
        let mut mapping = PaletteColorMapping::with_palette("Gray_Interp");
        mapping.set_scale_mode(PaletteScaleMode::User {
            least_positive: 0.,
            most_positive: 1.,
            least_negative: 0.,
            most_negative: -1.,
        });
        let data = [0.75, 0., -0.5, f32::NAN];
        let mut stats = FastStatistics::new();
        stats.update(&data);
        let mut rgba = vec![RGBA::new(9., 9., 9., 9.); 4];
        color_scalars_with_palette(&stats, &mapping, palette, &data, &mut rgba);
        assert_eq!(rgba[0], palette.color(0.75, true));
        assert_eq!(rgba[1], TRANSPARENT);
        assert_eq!(rgba[2], palette.color(-0.5, true));
        assert_eq!(rgba[3], TRANSPARENT);
    }

    #[test]
    fn label_coloring() {
        let mut table = LabelTable::new();
        table.insert(1, Label::new("V1", RGBA::new(1., 0., 0., 1.)));
        let data = [1., 42.];
        let mut rgba = vec![RGBA::new(9., 9., 9., 9.); 2];
        color_indices_with_label_table(&table, &data, &mut rgba);
        assert_eq!(rgba[0], RGBA::new(1., 0., 0., 1.));
        assert_eq!(rgba[1], TRANSPARENT);
    }

    #[test]
    fn bytes() {
        assert_eq!(to_rgba8(RGBA::new(1., 0.5, 0., 2.)), RGBA::new(255, 127, 0, 255));
    }
}
