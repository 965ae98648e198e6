//! Conversion of canvases to 8-bit images and PNG bytes.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};
use ring_common::{RingError, RingResult};

use crate::canvas::Canvas;

/// Convert to an 8-bit straight-alpha RGBA image.
pub fn to_rgba_image(canvas: &Canvas) -> RgbaImage {
    RgbaImage::from_fn(canvas.width(), canvas.height(), |x, y| {
        Rgba(canvas.pixel_straight(i64::from(x), i64::from(y)).to_rgba8())
    })
}

/// Encode the canvas as PNG.
pub fn encode_png(canvas: &Canvas) -> RingResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    to_rgba_image(canvas)
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| RingError::Encoding(e.to_string()))?;
    Ok(buf.into_inner())
}
