//! # Ring Common
//!
//! Shared types, errors, and constants used across RingCaptcha components.
//!
//! ## Modules
//! - `types` - JSON-RPC envelopes and captcha method params/results
//! - `error` - The `RingError` taxonomy
//! - `constants` - Image limits, layout parameters, and service defaults

pub mod constants;
pub mod error;
pub mod types;

pub use error::{RingError, RingResult};
pub use types::*;
