//! Canvas fills and the overlay blend operator.
//!
//! The blend works on premultiplied channels. `base` is the bottom layer and
//! `applied` the top layer; the operator is not commutative.

use ring_common::constants::GRADIENT_MIN_EXTENT;
use ring_common::{RingError, RingResult};

use crate::canvas::Canvas;
use crate::color::{Color, PremulColor};

/// Direction of a linear gradient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GradientAxis {
    /// Left to right; one colour per column
    Horizontal,
    /// Top to bottom; one colour per row
    Vertical,
}

/// Fill every pixel with `color`.
pub fn fill_solid(canvas: &mut Canvas, color: Color) {
    let pm = color.to_premultiplied();
    canvas.pixels_mut().fill(pm);
}

/// Fill the canvas with a linear gradient from `start` to `end`.
///
/// Each channel steps by `(end - start) / extent` before every column (row)
/// is written, so the first column is one step past `start` and the last
/// column lands on `end`.
pub fn fill_linear_gradient(
    canvas: &mut Canvas,
    start: Color,
    end: Color,
    axis: GradientAxis,
) -> RingResult<()> {
    let (width, height) = canvas.dimensions();
    if width.min(height) < GRADIENT_MIN_EXTENT {
        return Err(RingError::CanvasTooSmall { width, height });
    }

    let extent = match axis {
        GradientAxis::Horizontal => width,
        GradientAxis::Vertical => height,
    };
    let steps = gradient_steps(start, end, extent);

    match axis {
        GradientAxis::Horizontal => {
            for y in 0..height {
                canvas.row_mut(y).copy_from_slice(&steps);
            }
        }
        GradientAxis::Vertical => {
            for (y, c) in steps.into_iter().enumerate() {
                canvas.row_mut(y as u32).fill(c);
            }
        }
    }

    Ok(())
}

fn gradient_steps(start: Color, end: Color, extent: u32) -> Vec<PremulColor> {
    let n = f64::from(extent);
    let dr = (end.r - start.r) / n;
    let dg = (end.g - start.g) / n;
    let db = (end.b - start.b) / n;
    let da = (end.a - start.a) / n;

    let mut c = start;
    (0..extent)
        .map(|_| {
            c.r += dr;
            c.g += dg;
            c.b += db;
            c.a += da;
            c.to_premultiplied()
        })
        .collect()
}

/// Overlay one premultiplied channel of `applied` onto `base`.
pub fn blend_channel_overlay(c_base: f64, c_applied: f64, a_base: f64, a_applied: f64) -> f64 {
    if 2.0 * c_base < a_base {
        2.0 * c_base * c_applied + c_applied * (1.0 - a_base) + c_base * (1.0 - a_applied)
    } else {
        c_base * (1.0 + a_applied) + c_applied * (1.0 + a_base)
            - 2.0 * c_base * c_applied
            - a_base * a_applied
    }
}

/// Screen-style alpha combine.
pub fn blend_alpha_overlay(a_base: f64, a_applied: f64) -> f64 {
    a_base + a_applied - a_base * a_applied
}

/// Overlay a single pixel.
pub fn blend_pixel_overlay(base: PremulColor, applied: PremulColor) -> PremulColor {
    PremulColor {
        r: blend_channel_overlay(base.r, applied.r, base.a, applied.a),
        g: blend_channel_overlay(base.g, applied.g, base.a, applied.a),
        b: blend_channel_overlay(base.b, applied.b, base.a, applied.a),
        a: blend_alpha_overlay(base.a, applied.a),
    }
}

/// Overlay `applied` onto `base`, producing a new canvas.
pub fn blend_overlay(base: &Canvas, applied: &Canvas) -> RingResult<Canvas> {
    if base.dimensions() != applied.dimensions() {
        return Err(RingError::DimensionMismatch {
            base_width: base.width(),
            base_height: base.height(),
            applied_width: applied.width(),
            applied_height: applied.height(),
        });
    }

    let mut out = Canvas::new(base.width(), base.height());
    for ((o, b), a) in out
        .pixels_mut()
        .iter_mut()
        .zip(base.pixels())
        .zip(applied.pixels())
    {
        *o = blend_pixel_overlay(*b, *a);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < EPS
    }

    fn speckled(width: u32, height: u32) -> Canvas {
        let mut canvas = Canvas::new(width, height);
        for y in 0..height {
            for x in 0..width {
                let a = f64::from((x * 7 + y * 3) % 11) / 10.0;
                let c = Color::new(
                    f64::from(x % 5) / 4.0,
                    f64::from(y % 3) / 2.0,
                    0.25,
                    a.min(1.0),
                );
                canvas.set_straight(i64::from(x), i64::from(y), c);
            }
        }
        canvas
    }

    #[test]
    fn test_fill_solid() {
        let mut canvas = Canvas::new(3, 2);
        fill_solid(&mut canvas, Color::new(1.0, 0.0, 0.0, 0.5));
        assert!(canvas
            .pixels()
            .iter()
            .all(|p| *p == PremulColor::new(0.5, 0.0, 0.0, 0.5)));
    }

    #[test]
    fn test_horizontal_gradient_endpoints() {
        let mut canvas = Canvas::new(10, 4);
        fill_linear_gradient(&mut canvas, Color::WHITE, Color::BLACK, GradientAxis::Horizontal)
            .unwrap();

        let first = canvas.pixel(0, 2);
        let last = canvas.pixel(9, 3);
        assert!(close(first.r, 0.9), "first column {}", first.r);
        assert!(close(last.r, 0.0), "last column {}", last.r);
        assert!(close(first.a, 1.0));

        // Columns are constant down the image
        for x in 0..10 {
            assert_eq!(canvas.pixel(x, 0), canvas.pixel(x, 3));
        }
    }

    #[test]
    fn test_vertical_gradient_rows() {
        let mut canvas = Canvas::new(4, 5);
        fill_linear_gradient(&mut canvas, Color::BLACK, Color::WHITE, GradientAxis::Vertical)
            .unwrap();

        assert!(close(canvas.pixel(0, 0).g, 0.2));
        assert!(close(canvas.pixel(3, 4).g, 1.0));
        for y in 0..5 {
            assert_eq!(canvas.pixel(0, y), canvas.pixel(3, y));
        }
    }

    #[test]
    fn test_gradient_needs_three_pixels() {
        let mut canvas = Canvas::new(200, 2);
        let err = fill_linear_gradient(&mut canvas, Color::WHITE, Color::BLACK, GradientAxis::Horizontal)
            .unwrap_err();
        assert_eq!(err, RingError::CanvasTooSmall { width: 200, height: 2 });
        assert!(canvas.is_transparent());
    }

    #[test]
    fn test_overlay_with_transparent_is_identity() {
        let image = speckled(9, 6);
        let clear = Canvas::new(9, 6);

        // Transparent base, image on top
        let over_clear = blend_overlay(&clear, &image).unwrap();
        // Image as base, transparent on top
        let under_clear = blend_overlay(&image, &clear).unwrap();

        for ((o1, o2), src) in over_clear
            .pixels()
            .iter()
            .zip(under_clear.pixels())
            .zip(image.pixels())
        {
            for (got, want) in [(o1, src), (o2, src)] {
                assert!(close(got.r, want.r) && close(got.g, want.g));
                assert!(close(got.b, want.b) && close(got.a, want.a));
            }
        }
    }

    #[test]
    fn test_overlay_is_not_commutative() {
        let base = PremulColor::new(0.1, 0.1, 0.1, 1.0);
        let top = PremulColor::new(0.9, 0.9, 0.9, 1.0);
        let a = blend_pixel_overlay(base, top);
        let b = blend_pixel_overlay(top, base);
        assert!(!close(a.r, b.r));
        assert!(close(a.a, 1.0) && close(b.a, 1.0));
    }

    #[test]
    fn test_overlay_channel_branches() {
        // Dark base: 2*cB < aB
        assert!(close(blend_channel_overlay(0.2, 0.5, 1.0, 1.0), 0.2));
        // Light base
        assert!(close(blend_channel_overlay(0.8, 0.5, 1.0, 1.0), 0.8));
        assert!(close(blend_alpha_overlay(0.5, 0.5), 0.75));
    }

    #[test]
    fn test_overlay_dimension_mismatch() {
        let err = blend_overlay(&Canvas::new(4, 4), &Canvas::new(4, 5)).unwrap_err();
        assert!(matches!(err, RingError::DimensionMismatch { applied_height: 5, .. }));
    }
}
