//! Colour model.
//!
//! Two representations are kept apart by type:
//! - [`Color`] uses straight alpha (channels independent of opacity)
//! - [`PremulColor`] has R, G, B already scaled by A; canvases store this form
//!
//! All channels are `f64` in `[0, 1]`.

/// A colour with straight (non-premultiplied) alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// A colour with premultiplied alpha.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PremulColor {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::new(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::new(0.0, 0.0, 0.0, 1.0);
    pub const RED: Color = Color::new(1.0, 0.0, 0.0, 1.0);
    pub const GREEN: Color = Color::new(0.0, 1.0, 0.0, 1.0);
    pub const BLUE: Color = Color::new(0.0, 0.0, 1.0, 1.0);
    pub const CYAN: Color = Color::new(0.0, 1.0, 1.0, 1.0);
    pub const MAGENTA: Color = Color::new(1.0, 0.0, 1.0, 1.0);
    pub const YELLOW: Color = Color::new(1.0, 1.0, 0.0, 1.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque colour
    pub const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Same colour with a different opacity
    pub fn with_alpha(self, a: f64) -> Self {
        Self { a, ..self }
    }

    pub fn to_premultiplied(self) -> PremulColor {
        PremulColor {
            r: self.r * self.a,
            g: self.g * self.a,
            b: self.b * self.a,
            a: self.a,
        }
    }

    /// Quantize to 8-bit straight RGBA, clamping each channel to `[0, 1]`.
    pub fn to_rgba8(self) -> [u8; 4] {
        [
            quantize(self.r),
            quantize(self.g),
            quantize(self.b),
            quantize(self.a),
        ]
    }
}

impl PremulColor {
    pub const TRANSPARENT: PremulColor = PremulColor {
        r: 0.0,
        g: 0.0,
        b: 0.0,
        a: 0.0,
    };

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Undo the premultiplication. Zero alpha yields transparent black.
    pub fn to_straight(self) -> Color {
        if self.a == 0.0 {
            return Color::TRANSPARENT;
        }

        Color {
            r: self.r / self.a,
            g: self.g / self.a,
            b: self.b / self.a,
            a: self.a,
        }
    }
}

impl From<Color> for PremulColor {
    fn from(c: Color) -> Self {
        c.to_premultiplied()
    }
}

impl From<PremulColor> for Color {
    fn from(c: PremulColor) -> Self {
        c.to_straight()
    }
}

fn quantize(v: f64) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    fn assert_close(a: Color, b: Color) {
        assert!((a.r - b.r).abs() < EPS, "r: {} vs {}", a.r, b.r);
        assert!((a.g - b.g).abs() < EPS, "g: {} vs {}", a.g, b.g);
        assert!((a.b - b.b).abs() < EPS, "b: {} vs {}", a.b, b.b);
        assert!((a.a - b.a).abs() < EPS, "a: {} vs {}", a.a, b.a);
    }

    #[test]
    fn test_alpha_round_trip() {
        let samples = [
            Color::new(0.2, 0.4, 0.6, 0.5),
            Color::new(1.0, 0.0, 0.3, 0.01),
            Color::new(0.9, 0.9, 0.1, 1.0),
            Color::new(0.0, 0.0, 0.0, 0.75),
        ];

        for c in samples {
            assert_close(c.to_premultiplied().to_straight(), c);
        }
    }

    #[test]
    fn test_premultiply_scales_channels() {
        let p = Color::new(0.8, 0.4, 0.2, 0.5).to_premultiplied();
        assert_eq!(p, PremulColor::new(0.4, 0.2, 0.1, 0.5));
    }

    #[test]
    fn test_zero_alpha_is_transparent_black() {
        let straight = PremulColor::new(0.3, 0.2, 0.1, 0.0).to_straight();
        assert_eq!(straight, Color::TRANSPARENT);
        assert!(!straight.r.is_nan());
    }

    #[test]
    fn test_quantize_clamps() {
        assert_eq!(Color::new(1.2, -0.1, 0.5, 1.0).to_rgba8(), [255, 0, 128, 255]);
    }
}
