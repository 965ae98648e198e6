//! Premultiplied-alpha pixel grid.

use crate::color::{Color, PremulColor};

/// A mutable 2D grid of premultiplied pixels, `(0, 0)` at the top-left.
///
/// Reads outside the grid return transparent black and writes outside the
/// grid are ignored, so brushes can stamp across the border freely.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<PremulColor>,
}

impl Canvas {
    /// Create a fully transparent canvas
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![PremulColor::TRANSPARENT; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Raw pixels in row-major order
    pub fn pixels(&self) -> &[PremulColor] {
        &self.pixels
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= i64::from(self.width) || y >= i64::from(self.height) {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Pixel at `(x, y)`, or `None` outside the grid
    pub fn get(&self, x: i64, y: i64) -> Option<PremulColor> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    /// Pixel at `(x, y)`; transparent outside the grid
    pub fn pixel(&self, x: i64, y: i64) -> PremulColor {
        self.get(x, y).unwrap_or(PremulColor::TRANSPARENT)
    }

    /// Pixel at `(x, y)` with straight alpha; transparent outside the grid
    pub fn pixel_straight(&self, x: i64, y: i64) -> Color {
        self.pixel(x, y).to_straight()
    }

    /// Write a pixel. Out-of-range writes are no-ops.
    pub fn set(&mut self, x: i64, y: i64, color: PremulColor) {
        if let Some(i) = self.index(x, y) {
            self.pixels[i] = color;
        }
    }

    /// Write a straight-alpha colour, premultiplying it first
    pub fn set_straight(&mut self, x: i64, y: i64, color: Color) {
        self.set(x, y, color.to_premultiplied());
    }

    /// True when no pixel carries any opacity
    pub fn is_transparent(&self) -> bool {
        self.pixels.iter().all(|p| p.a == 0.0)
    }

    /// Mutable access to one row, used by the fill routines
    pub(crate) fn row_mut(&mut self, y: u32) -> &mut [PremulColor] {
        let w = self.width as usize;
        let start = y as usize * w;
        &mut self.pixels[start..start + w]
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [PremulColor] {
        &mut self.pixels
    }
}
