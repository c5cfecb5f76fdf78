//! Palettes and the settings that map scalar data onto them.
//!
//! A [`Palette`] is a list of control points over the normalized range
//! `[-1, 1]`. A [`PaletteColorMapping`] names the palette a map uses and
//! says how the map's values are normalized into that range.
//!
//! [`Palette`]: ./struct.Palette.html
//! [`PaletteColorMapping`]: ./struct.PaletteColorMapping.html

use rgb::RGBA;

/// A control point of a palette.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteScalarAndColor {
    /// Normalized scalar in `[-1, 1]`.
    pub scalar: f32,
    /// Color at the scalar.
    pub color: RGBA<f32>,
}

/// A named scalar to color transfer function.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    name: String,
    /// sorted by increasing scalar
    points: Vec<PaletteScalarAndColor>,
}

impl Palette {
    /// Create a palette from its control points, in any order.
    pub fn new<S: Into<String>>(name: S, mut points: Vec<PaletteScalarAndColor>) -> Self {
        points.sort_by(|a, b| a.scalar.total_cmp(&b.scalar));
        Palette {
            name: name.into(),
            points,
        }
    }

    /// Name of the palette.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Control points, by increasing scalar.
    pub fn points(&self) -> &[PaletteScalarAndColor] {
        &self.points
    }

    /// Color of a normalized scalar. Scalars outside of the control points
    /// take the color of the nearest end. Without interpolation, a scalar
    /// takes the color of the control point at or below it.
    pub fn color(&self, normalized: f32, interpolate: bool) -> RGBA<f32> {
        let (first, last) = match (self.points.first(), self.points.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return RGBA::new(0., 0., 0., 0.),
        };
        if normalized <= first.scalar {
            return first.color;
        }
        if normalized >= last.scalar {
            return last.color;
        }
        for w in self.points.windows(2) {
            let (lo, hi) = (&w[0], &w[1]);
            if normalized >= lo.scalar && normalized <= hi.scalar {
                let span = hi.scalar - lo.scalar;
                if !interpolate || span <= 0. {
                    return if normalized >= hi.scalar { hi.color } else { lo.color };
                }
                let t = (normalized - lo.scalar) / span;
                return RGBA::new(
                    lo.color.r + t * (hi.color.r - lo.color.r),
                    lo.color.g + t * (hi.color.g - lo.color.g),
                    lo.color.b + t * (hi.color.b - lo.color.b),
                    lo.color.a + t * (hi.color.a - lo.color.a),
                );
            }
        }
        last.color
    }
}

fn point(scalar: f32, r: f32, g: f32, b: f32) -> PaletteScalarAndColor {
    PaletteScalarAndColor {
        scalar,
        color: RGBA::new(r, g, b, 1.),
    }
}

/// The store palettes are looked up in by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaletteFile {
    palettes: Vec<Palette>,
}

impl PaletteFile {
    /// An empty palette store.
    pub fn new() -> Self {
        PaletteFile::default()
    }

    /// A store holding the standard palettes.
    pub fn with_default_palettes() -> Self {
        let mut file = PaletteFile::new();
        file.add(Palette::new(
            "Gray_Interp",
            vec![point(-1., 0., 0., 0.), point(0., 0., 0., 0.), point(1., 1., 1., 1.)],
        ));
        file.add(Palette::new(
            "ROY-BIG-BL",
            vec![
                point(1.0, 1., 1., 0.),
                point(0.875, 1., 0.784, 0.),
                point(0.75, 1., 0.471, 0.),
                point(0.625, 1., 0., 0.),
                point(0.5, 0.627, 0., 0.),
                point(0.375, 0.392, 0., 0.),
                point(0.0, 0., 0., 0.),
                point(-0.375, 0., 0., 0.392),
                point(-0.5, 0., 0., 0.627),
                point(-0.625, 0., 0.392, 1.),
                point(-0.75, 0., 0.784, 0.784),
                point(-1.0, 0., 1., 0.),
            ],
        ));
        file
    }

    /// Add a palette, replacing any palette with the same name.
    pub fn add(&mut self, palette: Palette) {
        self.palettes.retain(|p| p.name != palette.name);
        self.palettes.push(palette);
    }

    /// Find a palette by name.
    pub fn palette_by_name(&self, name: &str) -> Option<&Palette> {
        self.palettes.iter().find(|p| p.name == name)
    }

    /// Number of palettes.
    pub fn len(&self) -> usize {
        self.palettes.len()
    }

    /// Whether the store holds no palette.
    pub fn is_empty(&self) -> bool {
        self.palettes.is_empty()
    }
}

/// How data values are normalized before looking up a palette color.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaletteScaleMode {
    /// Positive values span `(0, most positive]`, negative values
    /// `[most negative, 0)`.
    Auto,
    /// The bounds are percentiles of the positive and negative values.
    AutoPercentage {
        /// Percentile of the positive values mapped to `0`.
        least_positive: f32,
        /// Percentile of the positive values mapped to `1`.
        most_positive: f32,
        /// Percentile of the negative magnitudes mapped to `0`.
        least_negative: f32,
        /// Percentile of the negative magnitudes mapped to `-1`.
        most_negative: f32,
    },
    /// The bounds are given explicitly.
    User {
        /// Value mapped to `0` on the positive side.
        least_positive: f32,
        /// Value mapped to `1`.
        most_positive: f32,
        /// Value mapped to `0` on the negative side.
        least_negative: f32,
        /// Value mapped to `-1`.
        most_negative: f32,
    },
}

/// The coloring settings of a map (or of a whole file).
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteColorMapping {
    selected_palette_name: String,
    scale_mode: PaletteScaleMode,
    interpolate_colors: bool,
    display_positive: bool,
    display_negative: bool,
    display_zero: bool,
    modified: bool,
}

impl Default for PaletteColorMapping {
    fn default() -> Self {
        PaletteColorMapping {
            selected_palette_name: "ROY-BIG-BL".to_string(),
            scale_mode: PaletteScaleMode::AutoPercentage {
                least_positive: 4.,
                most_positive: 96.,
                least_negative: 2.,
                most_negative: 98.,
            },
            interpolate_colors: true,
            display_positive: true,
            display_negative: true,
            display_zero: false,
            modified: false,
        }
    }
}

impl PaletteColorMapping {
    /// Default settings using the named palette.
    pub fn with_palette<S: Into<String>>(name: S) -> Self {
        PaletteColorMapping {
            selected_palette_name: name.into(),
            ..Default::default()
        }
    }

    /// Name of the palette to look up.
    pub fn selected_palette_name(&self) -> &str {
        &self.selected_palette_name
    }

    /// Select another palette.
    pub fn set_selected_palette_name<S: Into<String>>(&mut self, name: S) {
        let name = name.into();
        if name != self.selected_palette_name {
            self.selected_palette_name = name;
            self.modified = true;
        }
    }

    /// How values are normalized.
    pub fn scale_mode(&self) -> PaletteScaleMode {
        self.scale_mode
    }

    /// Change how values are normalized.
    pub fn set_scale_mode(&mut self, mode: PaletteScaleMode) {
        if mode != self.scale_mode {
            self.scale_mode = mode;
            self.modified = true;
        }
    }

    /// Whether colors are interpolated between control points.
    pub fn is_interpolate_colors(&self) -> bool {
        self.interpolate_colors
    }

    /// Turn interpolation between control points on or off.
    pub fn set_interpolate_colors(&mut self, value: bool) {
        if value != self.interpolate_colors {
            self.interpolate_colors = value;
            self.modified = true;
        }
    }

    /// Whether positive values are colored.
    pub fn is_display_positive(&self) -> bool {
        self.display_positive
    }

    /// Whether negative values are colored.
    pub fn is_display_negative(&self) -> bool {
        self.display_negative
    }

    /// Whether zero values are colored.
    pub fn is_display_zero(&self) -> bool {
        self.display_zero
    }

    /// Choose which signs of values are colored.
    pub fn set_display(&mut self, positive: bool, negative: bool, zero: bool) {
        if (positive, negative, zero) != (self.display_positive, self.display_negative, self.display_zero) {
            self.display_positive = positive;
            self.display_negative = negative;
            self.display_zero = zero;
            self.modified = true;
        }
    }

    /// Whether the settings changed since the last `clear_modified`.
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Forget about previous changes.
    pub fn clear_modified(&mut self) {
        self.modified = false;
    }
}
