//! Brush kernels.
//!
//! A brush stamps a round colour footprint onto a canvas. Two kernels exist:
//! - [`SoftBrush`]: opaque core, linear fade between the inner and outer radius
//! - [`SolidBrush`]: hard disk with a half-opacity ring on the boundary
//!
//! Compositing onto the canvas uses straight-alpha "over":
//! `outA = op + destA * (1 - op)`, `outC = (srcC * op + destC * destA * (1 - op)) / outA`.

use std::sync::OnceLock;

use crate::canvas::Canvas;
use crate::color::Color;
use crate::geometry::{Point2D, distance};

/// Pixels within this distance of the solid brush radius are anti-aliased
const SOLID_EDGE_EPSILON: f64 = 0.1;

/// Opacity of the solid brush boundary ring
const SOLID_EDGE_OPACITY: f64 = 0.5;

/// A stamping kernel.
#[derive(Debug, Clone)]
pub enum Brush {
    Soft(SoftBrush),
    Solid(SolidBrush),
}

impl Brush {
    /// Radius of the whole footprint
    pub fn outer_radius(&self) -> f64 {
        match self {
            Self::Soft(b) => b.outer_radius(),
            Self::Solid(b) => b.radius(),
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Soft(b) => b.color(),
            Self::Solid(b) => b.color(),
        }
    }

    /// Stamp the brush centred on `center`.
    ///
    /// `blend` selects accumulating strokes; without it a fainter stroke never
    /// darkens a pixel that is already more opaque. The solid kernel always
    /// blends its boundary ring.
    pub fn stamp(&self, canvas: &mut Canvas, center: Point2D, blend: bool) {
        match self {
            Self::Soft(b) => b.stamp(canvas, center, blend),
            Self::Solid(b) => b.stamp(canvas, center),
        }
    }
}

impl From<SoftBrush> for Brush {
    fn from(b: SoftBrush) -> Self {
        Self::Soft(b)
    }
}

impl From<SolidBrush> for Brush {
    fn from(b: SolidBrush) -> Self {
        Self::Solid(b)
    }
}

// ============================================================================
// Soft brush
// ============================================================================

/// Round brush with soft edges.
#[derive(Debug, Clone)]
pub struct SoftBrush {
    inner_radius: f64,
    outer_radius: f64,
    color: Color,
    sampling: bool,
    sample: OnceLock<SampleTile>,
}

/// The brush's isolated stamp, rendered once around an integer pixel.
#[derive(Debug, Clone)]
struct SampleTile {
    /// Distance from the tile edge to its centre pixel
    half: i64,
    canvas: Canvas,
}

impl SoftBrush {
    /// Create a soft brush. Sample tiles are enabled.
    pub fn new(inner_radius: f64, outer_radius: f64, color: Color) -> Self {
        Self {
            inner_radius,
            outer_radius,
            color,
            sampling: true,
            sample: OnceLock::new(),
        }
    }

    /// Enable or disable stamping from the cached sample tile
    pub fn with_sampling(mut self, enabled: bool) -> Self {
        self.sampling = enabled;
        self
    }

    pub fn inner_radius(&self) -> f64 {
        self.inner_radius
    }

    pub fn outer_radius(&self) -> f64 {
        self.outer_radius
    }

    pub fn color(&self) -> Color {
        self.color
    }

    /// True once the sample tile has been rendered
    pub fn has_sample(&self) -> bool {
        self.sample.get().is_some()
    }

    /// Opacity of the footprint at distance `d` from the centre, or `None`
    /// outside the outer radius.
    pub fn opacity_at(&self, d: f64) -> Option<f64> {
        if d > self.outer_radius {
            return None;
        }
        if d <= self.inner_radius {
            return Some(self.color.a);
        }
        Some(1.0 - (d - self.inner_radius) / (self.outer_radius - self.inner_radius))
    }

    /// Stamp using the sample tile when the centre is on a pixel address,
    /// otherwise compute every pixel directly.
    pub fn stamp(&self, canvas: &mut Canvas, center: Point2D, blend: bool) {
        if self.sampling && center.is_integral() {
            self.stamp_sampled(canvas, center, blend);
        } else {
            self.stamp_direct(canvas, center, blend);
        }
    }

    /// Stamp computing distance and opacity for every pixel.
    pub fn stamp_direct(&self, canvas: &mut Canvas, center: Point2D, blend: bool) {
        let (x0, y0, x1, y1) = bounding_square(center, self.outer_radius);

        for x in x0..=x1 {
            for y in y0..=y1 {
                let d = distance(Point2D::new(x as f64, y as f64), center);
                if let Some(opacity) = self.opacity_at(d) {
                    paint(canvas, x, y, self.color, opacity, blend);
                }
            }
        }
    }

    fn stamp_sampled(&self, canvas: &mut Canvas, center: Point2D, blend: bool) {
        let tile = self.sample.get_or_init(|| self.render_sample());
        let cx = center.x as i64;
        let cy = center.y as i64;

        for ty in 0..i64::from(tile.canvas.height()) {
            for tx in 0..i64::from(tile.canvas.width()) {
                let s = tile.canvas.pixel_straight(tx, ty);
                if s.a == 0.0 {
                    continue;
                }
                paint(canvas, cx - tile.half + tx, cy - tile.half + ty, s, s.a, blend);
            }
        }
    }

    fn render_sample(&self) -> SampleTile {
        let half = self.outer_radius.ceil().max(0.0) as i64;
        let side = (2 * half + 1) as u32;
        let mut canvas = Canvas::new(side, side);
        let center = Point2D::new(half as f64, half as f64);
        self.stamp_direct(&mut canvas, center, true);

        tracing::trace!(side = side, outer_radius = self.outer_radius, "Rendered brush sample");

        SampleTile { half, canvas }
    }
}

// ============================================================================
// Solid brush
// ============================================================================

/// Round brush without soft edges.
#[derive(Debug, Clone, PartialEq)]
pub struct SolidBrush {
    radius: f64,
    color: Color,
}

impl SolidBrush {
    pub fn new(radius: f64, color: Color) -> Self {
        Self { radius, color }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub fn color(&self) -> Color {
        self.color
    }

    pub fn stamp(&self, canvas: &mut Canvas, center: Point2D) {
        let (x0, y0, x1, y1) = bounding_square(center, self.radius);

        for x in x0..=x1 {
            for y in y0..=y1 {
                let d = distance(Point2D::new(x as f64, y as f64), center);
                if d > self.radius {
                    continue;
                }
                if (d - self.radius).abs() < SOLID_EDGE_EPSILON {
                    paint(canvas, x, y, self.color, SOLID_EDGE_OPACITY, true);
                } else {
                    canvas.set_straight(x, y, self.color);
                }
            }
        }
    }
}

// ============================================================================
// Pixel compositing
// ============================================================================

/// Integer square `[round(c - r), round(c + r)]` on both axes.
fn bounding_square(center: Point2D, radius: f64) -> (i64, i64, i64, i64) {
    (
        (center.x - radius).round() as i64,
        (center.y - radius).round() as i64,
        (center.x + radius).round() as i64,
        (center.y + radius).round() as i64,
    )
}

/// Straight-alpha "over" of `src` at `opacity` onto `dest`.
pub fn composite_over(src: Color, opacity: f64, dest: Color) -> Color {
    let a = opacity + dest.a * (1.0 - opacity);
    if a == 0.0 {
        return Color::new(src.r, src.g, src.b, a);
    }

    Color {
        r: (src.r * opacity + dest.r * dest.a * (1.0 - opacity)) / a,
        g: (src.g * opacity + dest.g * dest.a * (1.0 - opacity)) / a,
        b: (src.b * opacity + dest.b * dest.a * (1.0 - opacity)) / a,
        a,
    }
}

/// Composite one footprint pixel onto the canvas.
///
/// Without blending the result is capped by the "ideal" pixel: the pure
/// brush colour at this opacity, as if nothing had been painted before. A
/// destination already more opaque than the ideal is left untouched.
fn paint(canvas: &mut Canvas, x: i64, y: i64, src: Color, opacity: f64, blend: bool) {
    let Some(dest) = canvas.get(x, y).map(|p| p.to_straight()) else {
        return;
    };

    let mut out = composite_over(src, opacity, dest);

    if !blend {
        let ideal = src.with_alpha(opacity);
        if ideal.a < dest.a {
            return;
        }
        if out.a > ideal.a {
            out = ideal;
        }
    }

    canvas.set_straight(x, y, out);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::PremulColor;

    const EPS: f64 = 1e-9;

    fn assert_canvases_close(a: &Canvas, b: &Canvas) {
        assert_eq!(a.dimensions(), b.dimensions());
        for (i, (p, q)) in a.pixels().iter().zip(b.pixels()).enumerate() {
            let diff = (p.r - q.r)
                .abs()
                .max((p.g - q.g).abs())
                .max((p.b - q.b).abs())
                .max((p.a - q.a).abs());
            assert!(diff < EPS, "pixel {i}: {p:?} vs {q:?}");
        }
    }

    fn striped(width: u32, height: u32) -> Canvas {
        let mut canvas = Canvas::new(width, height);
        for y in 0..height {
            for x in 0..width {
                if (x / 3 + y / 2) % 2 == 0 {
                    let c = Color::new(0.3, 0.7, 0.2, f64::from(x % 4) / 4.0);
                    canvas.set_straight(i64::from(x), i64::from(y), c);
                }
            }
        }
        canvas
    }

    #[test]
    fn test_soft_opacity_profile() {
        let brush = SoftBrush::new(2.0, 6.0, Color::GREEN);
        assert_eq!(brush.opacity_at(0.0), Some(1.0));
        assert_eq!(brush.opacity_at(2.0), Some(1.0));
        assert_eq!(brush.opacity_at(4.0), Some(0.5));
        assert_eq!(brush.opacity_at(6.0), Some(0.0));
        assert_eq!(brush.opacity_at(6.01), None);
    }

    #[test]
    fn test_soft_stamp_on_transparent_canvas() {
        let mut canvas = Canvas::new(21, 21);
        let brush = SoftBrush::new(3.0, 6.0, Color::RED);
        brush.stamp_direct(&mut canvas, Point2D::new(10.0, 10.0), true);

        assert_eq!(canvas.pixel(10, 10), PremulColor::new(1.0, 0.0, 0.0, 1.0));
        // d = 4 -> opacity 2/3
        let straight = canvas.pixel_straight(10, 10 + 4);
        assert!((straight.a - (1.0 - 1.0 / 3.0)).abs() < EPS);
        assert!((straight.r - 1.0).abs() < EPS);
        assert_eq!(canvas.pixel(10, 17), PremulColor::TRANSPARENT);
        assert_eq!(canvas.pixel(0, 0), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_blend_over_existing_paint() {
        let mut canvas = Canvas::new(1, 1);
        canvas.set_straight(0, 0, Color::new(0.0, 0.0, 1.0, 1.0));

        let out = composite_over(Color::RED, 0.5, canvas.pixel_straight(0, 0));
        assert!((out.a - 1.0).abs() < EPS);
        assert!((out.r - 0.5).abs() < EPS);
        assert!((out.b - 0.5).abs() < EPS);
    }

    #[test]
    fn test_no_blend_does_not_accumulate() {
        let brush = SoftBrush::new(2.0, 8.0, Color::new(0.2, 0.4, 0.9, 1.0)).with_sampling(false);
        let center = Point2D::new(12.0, 12.0);

        let mut once = Canvas::new(25, 25);
        brush.stamp(&mut once, center, false);

        let mut many = once.clone();
        for _ in 0..5 {
            brush.stamp(&mut many, center, false);
        }

        for (single, repeated) in once.pixels().iter().zip(many.pixels()) {
            assert!(repeated.a <= single.a + EPS, "{} > {}", repeated.a, single.a);
        }
    }

    #[test]
    fn test_blend_does_accumulate() {
        let brush = SoftBrush::new(2.0, 8.0, Color::BLUE).with_sampling(false);
        let center = Point2D::new(12.0, 12.0);

        let mut canvas = Canvas::new(25, 25);
        brush.stamp(&mut canvas, center, true);
        let first = canvas.pixel(12, 18).a;
        brush.stamp(&mut canvas, center, true);
        assert!(canvas.pixel(12, 18).a > first);
    }

    #[test]
    fn test_no_blend_skips_more_opaque_destination() {
        let mut canvas = Canvas::new(21, 21);
        let before = Color::new(0.0, 1.0, 0.0, 0.9);
        canvas.set_straight(10, 16, before);

        // d = 6 from the centre -> opacity 1/3
        let brush = SoftBrush::new(3.0, 7.5, Color::RED);
        brush.stamp_direct(&mut canvas, Point2D::new(10.0, 10.0), false);

        assert_eq!(canvas.pixel(10, 16), before.to_premultiplied());
        // Inside the core the stroke wins
        assert_eq!(canvas.pixel(10, 10), Color::RED.to_premultiplied());
    }

    #[test]
    fn test_sampled_stamp_matches_direct() {
        for blend in [true, false] {
            for (inner, outer) in [(16.0, 32.0), (2.0, 3.0), (4.0 / 1.5, 4.0), (1.0, 3.0)] {
                let color = Color::new(0.6, 0.1, 0.8, 1.0);
                let sampled = SoftBrush::new(inner, outer, color);
                let direct = SoftBrush::new(inner, outer, color).with_sampling(false);

                let mut a = striped(40, 30);
                let mut b = a.clone();
                for center in [Point2D::new(20.0, 15.0), Point2D::new(0.0, 29.0), Point2D::new(22.0, 13.0)] {
                    sampled.stamp(&mut a, center, blend);
                    direct.stamp(&mut b, center, blend);
                }

                assert!(sampled.has_sample());
                assert!(!direct.has_sample());
                assert_canvases_close(&a, &b);
            }
        }
    }

    #[test]
    fn test_fractional_center_skips_sample() {
        let brush = SoftBrush::new(2.0, 4.0, Color::YELLOW);
        let mut canvas = Canvas::new(10, 10);
        brush.stamp(&mut canvas, Point2D::new(4.5, 4.25), false);
        assert!(!brush.has_sample());
        assert!(!canvas.is_transparent());
    }

    #[test]
    fn test_stamp_clips_at_border() {
        let brush = Brush::from(SoftBrush::new(3.0, 6.0, Color::CYAN));
        let mut canvas = Canvas::new(8, 8);
        brush.stamp(&mut canvas, Point2D::new(-2.0, -2.0), true);
        brush.stamp(&mut canvas, Point2D::new(100.0, 100.0), true);
        assert_eq!(canvas.pixel(0, 0), Color::CYAN.to_premultiplied());
        assert_eq!(canvas.pixel(7, 7), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_solid_brush_edge_is_half_opaque() {
        let brush = SolidBrush::new(3.0, Color::MAGENTA);
        let mut canvas = Canvas::new(9, 9);
        brush.stamp(&mut canvas, Point2D::new(4.0, 4.0));

        assert_eq!(canvas.pixel(4, 4), Color::MAGENTA.to_premultiplied());
        // Exactly on the radius
        assert!((canvas.pixel(7, 4).a - 0.5).abs() < EPS);
        // sqrt(5) is well inside
        assert_eq!(canvas.pixel(6, 5).a, 1.0);
        // sqrt(13) is outside
        assert_eq!(canvas.pixel(7, 6), PremulColor::TRANSPARENT);
    }

    #[test]
    fn test_brush_enum_dispatch() {
        let soft = Brush::from(SoftBrush::new(1.0, 5.0, Color::RED));
        let solid = Brush::from(SolidBrush::new(2.5, Color::BLUE));
        assert_eq!(soft.outer_radius(), 5.0);
        assert_eq!(solid.outer_radius(), 2.5);
        assert_eq!(solid.color(), Color::BLUE);
    }
}
