//! Shared constants for RingCaptcha components.

/// Minimum captcha image width in pixels
pub const CAPTCHA_IMAGE_MIN_WIDTH: u32 = 128;

/// Minimum captcha image height in pixels
pub const CAPTCHA_IMAGE_MIN_HEIGHT: u32 = 128;

/// Smallest number of rings drawn on an image
pub const RING_MIN_COUNT: u32 = 3;

/// Largest number of rings drawn on an image
pub const RING_MAX_COUNT: u32 = 6;

/// Smallest ring radius in pixels
pub const RING_MIN_RADIUS: u32 = 24;

/// Largest ring radius as a fraction of the smaller image side
pub const RING_RADIUS_FACTOR: f64 = 0.5;

/// Smallest brush outer radius in pixels
pub const BRUSH_OUTER_RADIUS_MIN: u32 = 2;

/// Largest brush outer radius in pixels
pub const BRUSH_OUTER_RADIUS_MAX: u32 = 32;

/// Maximum value of a randomly drawn 16-bit colour channel
pub const COLOUR_COMPONENT_MAX_VALUE: u32 = 65_535;

/// Ring stroke density coefficient bounds
pub const DENSITY_COEFFICIENT_MIN: f64 = 1.0;
pub const DENSITY_COEFFICIENT_MAX: f64 = 1.5;

/// Canvases smaller than this on either side cannot take a gradient
pub const GRADIENT_MIN_EXTENT: u32 = 3;

/// Default JSON-RPC listen address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:2000";

/// Default `Server` header value for image responses
pub const DEFAULT_SERVER_NAME: &str = "RingCaptcha";

/// Default captcha image side (pixels)
pub const DEFAULT_IMAGE_SIZE: u32 = 256;

/// Default answer validity (5 minutes)
pub const DEFAULT_CAPTCHA_TTL_SECS: u64 = 300;

/// Default interval between expiry sweeps (1 minute)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

/// Default cap on live registry records
pub const DEFAULT_MAX_RECORDS: usize = 100_000;

/// Default upper bound on a single image synthesis
pub const DEFAULT_COMPOSE_TIMEOUT_SECS: u64 = 10;

/// Default in-memory file cache volume (64 MiB)
pub const DEFAULT_FILE_CACHE_MAX_BYTES: usize = 64 * 1024 * 1024;

/// Task identifiers
pub mod ids {
    /// Prefix of every task id: RCS-{random}
    pub const TASK_ID_PREFIX: &str = "RCS-";

    /// Random bytes behind a task id
    pub const TASK_ID_RANDOM_BYTES: usize = 16;
}

/// Image format naming
pub mod image_format {
    /// Format name reported to clients
    pub const FORMAT_NAME: &str = "PNG";

    /// File extension (without the dot)
    pub const FILE_EXT: &str = "png";

    /// MIME type of served images
    pub const MIME_TYPE: &str = "image/png";
}

/// JSON-RPC method names
pub mod methods {
    pub const PING: &str = "ping";
    pub const CREATE_CAPTCHA: &str = "createCaptcha";
    pub const CHECK_CAPTCHA: &str = "checkCaptcha";
    pub const HAS_CAPTCHA: &str = "hasCaptcha";
    pub const SHOW_DIAGNOSTIC_DATA: &str = "showDiagnosticData";
}
