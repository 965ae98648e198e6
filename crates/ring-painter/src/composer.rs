//! Captcha image composition.
//!
//! An image is a gradient background with a random number of ring layers
//! overlaid on it. Every ring is drawn onto its own transparent canvas; the
//! layers are overlay-blended into an accumulator in generation order and
//! the accumulator is blended onto the background last.
//!
//! Random draws happen in a fixed order: background, ring count, then for
//! each ring its colour, brush radius, inner radius ratio, centre, ring
//! radius and density coefficient. Replaying the same values through a
//! [`RandomSource`] reproduces the same image.

use ring_common::constants::{
    BRUSH_OUTER_RADIUS_MAX, BRUSH_OUTER_RADIUS_MIN, CAPTCHA_IMAGE_MIN_HEIGHT,
    CAPTCHA_IMAGE_MIN_WIDTH, COLOUR_COMPONENT_MAX_VALUE, DENSITY_COEFFICIENT_MAX,
    DENSITY_COEFFICIENT_MIN, RING_MAX_COUNT, RING_MIN_COUNT, RING_MIN_RADIUS, RING_RADIUS_FACTOR,
};
use ring_common::{RingError, RingResult};
use tracing::debug;

use crate::brush::{Brush, SoftBrush};
use crate::canvas::Canvas;
use crate::color::Color;
use crate::composite::{GradientAxis, blend_overlay, fill_linear_gradient};
use crate::geometry::Point2D;
use crate::random::RandomSource;
use crate::shape::draw_ring;

/// Density coefficient granularity: kd = MIN + k / 10
const DENSITY_COEFFICIENT_DIVISOR: f64 = 10.0;

/// Brush outer radius upper bound as a fraction of the smaller side
const BRUSH_RADIUS_DIVISOR: f64 = 16.0;

/// Rendering knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposerSettings {
    /// Stamp from the cached brush tile where possible
    pub use_brush_sample: bool,
    /// Let overlapping stamps of one ring accumulate
    pub blend_strokes: bool,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            use_brush_sample: true,
            blend_strokes: false,
        }
    }
}

/// A finished captcha: the picture and its answer.
#[derive(Debug, Clone)]
pub struct CaptchaImage {
    canvas: Canvas,
    ring_count: u32,
}

impl CaptchaImage {
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    /// Number of rings drawn, i.e. the correct answer
    pub fn ring_count(&self) -> u32 {
        self.ring_count
    }

    pub fn into_parts(self) -> (Canvas, u32) {
        (self.canvas, self.ring_count)
    }
}

/// The four background gradients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    HorizontalWhiteToBlack,
    HorizontalBlackToWhite,
    VerticalWhiteToBlack,
    VerticalBlackToWhite,
}

impl Background {
    fn from_draw(v: u32) -> RingResult<Self> {
        match v {
            1 => Ok(Self::HorizontalWhiteToBlack),
            2 => Ok(Self::HorizontalBlackToWhite),
            3 => Ok(Self::VerticalWhiteToBlack),
            4 => Ok(Self::VerticalBlackToWhite),
            other => Err(RingError::Random(format!("background type {other} out of range"))),
        }
    }

    fn gradient(self) -> (Color, Color, GradientAxis) {
        match self {
            Self::HorizontalWhiteToBlack => (Color::WHITE, Color::BLACK, GradientAxis::Horizontal),
            Self::HorizontalBlackToWhite => (Color::BLACK, Color::WHITE, GradientAxis::Horizontal),
            Self::VerticalWhiteToBlack => (Color::WHITE, Color::BLACK, GradientAxis::Vertical),
            Self::VerticalBlackToWhite => (Color::BLACK, Color::WHITE, GradientAxis::Vertical),
        }
    }

    pub fn render(self, width: u32, height: u32) -> RingResult<Canvas> {
        let (start, end, axis) = self.gradient();
        let mut canvas = Canvas::new(width, height);
        fill_linear_gradient(&mut canvas, start, end, axis)?;
        Ok(canvas)
    }
}

/// Randomly drawn parameters of one ring.
#[derive(Debug, Clone, PartialEq)]
pub struct RingLayer {
    pub color: Color,
    pub outer_radius: f64,
    pub inner_radius: f64,
    pub center: Point2D,
    pub ring_radius: f64,
    pub density_degrees: f64,
}

impl RingLayer {
    /// Draw a layer for a `width` x `height` image.
    pub fn random<R: RandomSource + ?Sized>(width: u32, height: u32, rng: &mut R) -> RingResult<Self> {
        let min_dim = width.min(height);

        let color = Color::opaque(
            random_channel(rng)?,
            random_channel(rng)?,
            random_channel(rng)?,
        );

        let outer_max = (f64::from(min_dim) / BRUSH_RADIUS_DIVISOR)
            .min(f64::from(BRUSH_OUTER_RADIUS_MAX))
            .max(f64::from(BRUSH_OUTER_RADIUS_MIN))
            .round() as u32;
        let outer_radius = f64::from(rng.uniform(BRUSH_OUTER_RADIUS_MIN, outer_max)?);

        let inner_radius = match rng.uniform(1, 3)? {
            1 => outer_radius / 2.0,
            2 => outer_radius / 1.5,
            _ => outer_radius / 3.0,
        };

        let center = Point2D::new(
            f64::from(rng.uniform(0, width)?),
            f64::from(rng.uniform(0, height)?),
        );

        let ring_max = (f64::from(min_dim) * RING_RADIUS_FACTOR).round() as u32;
        let ring_radius = f64::from(rng.uniform(RING_MIN_RADIUS, ring_max)?);

        let kd_steps = ((DENSITY_COEFFICIENT_MAX - DENSITY_COEFFICIENT_MIN) * DENSITY_COEFFICIENT_DIVISOR)
            .round() as u32;
        let kd = DENSITY_COEFFICIENT_MIN + f64::from(rng.uniform(0, kd_steps)?) / DENSITY_COEFFICIENT_DIVISOR;
        let density_degrees = (kd * 2.0 * outer_radius / ring_radius).to_degrees();

        Ok(Self {
            color,
            outer_radius,
            inner_radius,
            center,
            ring_radius,
            density_degrees,
        })
    }

    /// Render the ring onto a fresh transparent canvas.
    pub fn render(&self, width: u32, height: u32, settings: &ComposerSettings) -> Canvas {
        let brush = Brush::from(
            SoftBrush::new(self.inner_radius, self.outer_radius, self.color)
                .with_sampling(settings.use_brush_sample),
        );

        let mut canvas = Canvas::new(width, height);
        let stamps = draw_ring(
            &mut canvas,
            &brush,
            self.center,
            self.ring_radius,
            self.density_degrees,
            settings.blend_strokes,
        );

        debug!(
            stamps = stamps,
            ring_radius = self.ring_radius,
            outer_radius = self.outer_radius,
            "Ring layer drawn"
        );

        canvas
    }
}

fn random_channel<R: RandomSource + ?Sized>(rng: &mut R) -> RingResult<f64> {
    let v = rng.uniform(0, COLOUR_COMPONENT_MAX_VALUE)?;
    Ok(f64::from(v) / f64::from(COLOUR_COMPONENT_MAX_VALUE))
}

/// Upper bound of the ring count for an image of this size
pub fn max_ring_count(width: u32, height: u32) -> u32 {
    let min_dim = width.min(height);
    let bound = if min_dim <= 128 {
        4
    } else if min_dim <= 160 {
        5
    } else {
        RING_MAX_COUNT
    };
    bound.min(RING_MAX_COUNT)
}

/// Compose a captcha image of `width` x `height` pixels.
pub fn compose<R: RandomSource + ?Sized>(
    width: u32,
    height: u32,
    settings: &ComposerSettings,
    rng: &mut R,
) -> RingResult<CaptchaImage> {
    if width < CAPTCHA_IMAGE_MIN_WIDTH || height < CAPTCHA_IMAGE_MIN_HEIGHT {
        return Err(RingError::DimensionsTooSmall { width, height });
    }

    let background = Background::from_draw(rng.uniform(1, 4)?)?;
    let ring_count = rng.uniform(RING_MIN_COUNT, max_ring_count(width, height))?;

    let mut layers = Vec::with_capacity(ring_count as usize);
    for _ in 0..ring_count {
        layers.push(RingLayer::random(width, height, rng)?);
    }

    let background = background.render(width, height)?;

    let mut accumulator = Canvas::new(width, height);
    for layer in &layers {
        let canvas = layer.render(width, height, settings);
        accumulator = blend_overlay(&accumulator, &canvas)?;
    }

    let canvas = blend_overlay(&background, &accumulator)?;

    debug!(width = width, height = height, ring_count = ring_count, "Captcha image composed");

    Ok(CaptchaImage { canvas, ring_count })
}
