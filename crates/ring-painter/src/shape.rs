//! Stroke paths: lines and rings walked by a brush.

use std::f64::consts::TAU;

use crate::brush::Brush;
use crate::canvas::Canvas;
use crate::geometry::Point2D;

/// Multiplier applied to the angle one brush footprint covers on the ring.
/// The ring stops short of its start by this much to avoid a dark seam.
const CLOSING_GAP_FACTOR: f64 = 1.2;

/// Stamp `brush` along the segment `p1 -> p2`.
///
/// The walk advances one pixel at a time along the longer axis, from `p1`
/// towards `p2`, with the shorter axis placed proportionally. Returns the
/// number of stamps.
pub fn draw_line(canvas: &mut Canvas, brush: &Brush, p1: Point2D, p2: Point2D, blend: bool) -> usize {
    let dx = p2.x - p1.x;
    let dy = p2.y - p1.y;
    let major = dx.abs().max(dy.abs());

    if major == 0.0 {
        brush.stamp(canvas, p1, blend);
        return 1;
    }

    let steps = major.floor() as usize;
    for i in 0..=steps {
        let t = i as f64 / major;
        brush.stamp(canvas, Point2D::new(p1.x + dx * t, p1.y + dy * t), blend);
    }

    steps + 1
}

/// Angle of the ring occupied by a brush of radius `brush_radius`, from the
/// law of cosines on the triangle (centre, stamp, footprint edge).
fn brush_footprint_angle(brush_radius: f64, ring_radius: f64) -> f64 {
    let r2 = 2.0 * ring_radius * ring_radius;
    let cos_phi = ((r2 - brush_radius * brush_radius) / r2).clamp(-1.0, 1.0);
    2.0 * cos_phi.acos()
}

/// Stamp `brush` around a circle.
///
/// `density_degrees` is the requested angle between neighbouring stamps. It
/// is shrunk so that a whole number of stamps tile the revolution, where the
/// count is floored from the angle left after the closing gap. Returns the
/// number of stamps; nothing is drawn for a non-positive step.
pub fn draw_ring(
    canvas: &mut Canvas,
    brush: &Brush,
    center: Point2D,
    radius: f64,
    density_degrees: f64,
    blend: bool,
) -> usize {
    let step = density_degrees.to_radians();
    if !step.is_finite() || step <= 0.0 {
        return 0;
    }

    let available = TAU - CLOSING_GAP_FACTOR * brush_footprint_angle(brush.outer_radius(), radius);
    let n = (available / step).floor();
    if !n.is_finite() || n < 1.0 {
        return 0;
    }

    let n = n as usize;
    let step = TAU / n as f64;
    for i in 0..n {
        let a = i as f64 * step;
        let p = Point2D::new(center.x + radius * a.cos(), center.y + radius * a.sin()).rounded();
        brush.stamp(canvas, p, blend);
    }

    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brush::{SoftBrush, SolidBrush};
    use crate::color::{Color, PremulColor};

    #[test]
    fn test_zero_length_line_stamps_once() {
        let brush = Brush::from(SolidBrush::new(1.0, Color::RED));
        let mut canvas = Canvas::new(8, 8);
        let p = Point2D::new(4.0, 4.0);

        assert_eq!(draw_line(&mut canvas, &brush, p, p, false), 1);
        assert_eq!(canvas.pixel(4, 4), Color::RED.to_premultiplied());
        assert_eq!(canvas.pixel(6, 4), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_axis_aligned_lines() {
        let brush = Brush::from(SolidBrush::new(0.5, Color::BLUE));
        let mut canvas = Canvas::new(16, 16);

        // Right to left
        let n = draw_line(&mut canvas, &brush, Point2D::new(12.0, 2.0), Point2D::new(3.0, 2.0), false);
        assert_eq!(n, 10);
        for x in 3..=12 {
            assert!(canvas.pixel(x, 2).a > 0.0, "column {x}");
        }

        // Bottom to top
        let n = draw_line(&mut canvas, &brush, Point2D::new(8.0, 14.0), Point2D::new(8.0, 6.0), false);
        assert_eq!(n, 9);
        for y in 6..=14 {
            assert!(canvas.pixel(8, y).a > 0.0, "row {y}");
        }
        assert_eq!(canvas.pixel(8, 5), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_diagonal_line_places_minor_axis_proportionally() {
        let brush = Brush::from(SolidBrush::new(0.5, Color::GREEN));
        let mut canvas = Canvas::new(16, 16);

        let n = draw_line(&mut canvas, &brush, Point2D::new(0.0, 0.0), Point2D::new(8.0, 4.0), false);
        assert_eq!(n, 9);
        assert!(canvas.pixel(0, 0).a > 0.0);
        assert!(canvas.pixel(4, 2).a > 0.0);
        assert!(canvas.pixel(8, 4).a > 0.0);
        assert_eq!(canvas.pixel(8, 0), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_ring_stamp_count_is_floored() {
        let brush = Brush::from(SoftBrush::new(2.5, 5.0, Color::RED));
        let mut canvas = Canvas::new(128, 128);

        // available = 2pi - 1.2 * 2 * acos(0.995), about 6.0431 rad; 10 degrees fit 34.6 times
        let n = draw_ring(&mut canvas, &brush, Point2D::new(64.0, 64.0), 50.0, 10.0, false);
        assert_eq!(n, 34);

        // First stamp sits at angle zero
        assert_eq!(canvas.pixel(114, 64), Color::RED.to_premultiplied());
        // The centre stays empty
        assert_eq!(canvas.pixel(64, 64), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_ring_rejects_bad_step() {
        let brush = Brush::from(SoftBrush::new(1.0, 2.0, Color::RED));
        let mut canvas = Canvas::new(64, 64);
        let c = Point2D::new(32.0, 32.0);

        assert_eq!(draw_ring(&mut canvas, &brush, c, 20.0, 0.0, false), 0);
        assert_eq!(draw_ring(&mut canvas, &brush, c, 20.0, -5.0, false), 0);
        assert_eq!(draw_ring(&mut canvas, &brush, c, 20.0, f64::NAN, false), 0);
        assert_eq!(draw_ring(&mut canvas, &brush, c, 20.0, f64::INFINITY, false), 0);
        assert!(canvas.is_transparent());
    }

    #[test]
    fn test_ring_smaller_than_brush_draws_nothing() {
        let brush = Brush::from(SoftBrush::new(10.0, 30.0, Color::RED));
        let mut canvas = Canvas::new(64, 64);

        assert_eq!(draw_ring(&mut canvas, &brush, Point2D::new(32.0, 32.0), 10.0, 5.0, false), 0);
        assert!(canvas.is_transparent());
    }

    #[test]
    fn test_step_larger_than_ring_draws_nothing() {
        let brush = Brush::from(SoftBrush::new(1.0, 2.0, Color::RED));
        let mut canvas = Canvas::new(64, 64);

        assert_eq!(draw_ring(&mut canvas, &brush, Point2D::new(32.0, 32.0), 20.0, 400.0, false), 0);
        assert!(canvas.is_transparent());
    }
}
