//! Common error types for RingCaptcha components.

use thiserror::Error;

/// Result alias used by the library crates
pub type RingResult<T> = Result<T, RingError>;

/// Errors across RingCaptcha components
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RingError {
    /// Requested captcha image is below the minimum size
    #[error("Dimensions too small: {width}x{height}")]
    DimensionsTooSmall { width: u32, height: u32 },

    /// Canvas cannot hold a gradient
    #[error("Canvas is too small: {width}x{height}")]
    CanvasTooSmall { width: u32, height: u32 },

    /// Two canvases of different sizes were blended
    #[error("Images have different dimensions: {base_width}x{base_height} vs {applied_width}x{applied_height}")]
    DimensionMismatch {
        base_width: u32,
        base_height: u32,
        applied_width: u32,
        applied_height: u32,
    },

    /// Randomness source failure
    #[error("Random source error: {0}")]
    Random(String),

    /// Image encoding failure
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// A live record with this id already exists
    #[error("Duplicate ID: {0}")]
    DuplicateId(String),

    /// No live record with this id
    #[error("ID is not found: {0}")]
    UnknownId(String),

    /// Request carried an empty task id
    #[error("ID is not set")]
    IdNotSet,

    /// Request carried no answer
    #[error("Answer is not set")]
    AnswerNotSet,

    /// Registry reached its record limit
    #[error("Registry is full: {0} records")]
    RegistryFull(usize),

    /// Images are returned inline, nothing is stored
    #[error("File storage is disabled")]
    StorageDisabled,

    /// Image store I/O failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input/request
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl RingError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::DimensionsTooSmall { .. } => 400,
            Self::CanvasTooSmall { .. } => 500,
            Self::DimensionMismatch { .. } => 500,
            Self::Random(_) => 500,
            Self::Encoding(_) => 500,
            Self::DuplicateId(_) => 409,
            Self::UnknownId(_) => 404,
            Self::IdNotSet => 400,
            Self::AnswerNotSet => 400,
            Self::RegistryFull(_) => 503,
            Self::StorageDisabled => 403,
            Self::Storage(_) => 500,
            Self::InvalidInput(_) => 400,
            Self::Timeout(_) => 504,
            Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error should be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RegistryFull(_) | Self::Storage(_) | Self::Timeout(_) | Self::DuplicateId(_)
        )
    }

    /// Returns true for errors caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code())
    }
}

impl From<std::io::Error> for RingError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
