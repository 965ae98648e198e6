//! RingCaptcha image synthesis.
//!
//! Renders ring-pattern captcha images: soft round brushes are walked along
//! circles, each ring on its own layer, and the layers are overlay-blended
//! onto a gradient background. The number of rings is the captcha answer.
//!
//! Pixels are `f64` RGBA with premultiplied alpha while rendering; the
//! [`export`] module turns a finished canvas into PNG bytes.

pub mod brush;
pub mod canvas;
pub mod color;
pub mod composer;
pub mod composite;
pub mod export;
pub mod geometry;
pub mod random;
pub mod shape;

pub use brush::{Brush, SoftBrush, SolidBrush};
pub use canvas::Canvas;
pub use color::{Color, PremulColor};
pub use composer::{CaptchaImage, ComposerSettings, compose, max_ring_count};
pub use export::encode_png;
pub use geometry::Point2D;
pub use random::{RandomSource, ScriptedSource};
