//! Input validation errors.

use thiserror::Error;

/// Errors raised while validating session input, before any run starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// The video link was empty or only whitespace.
    #[error("Please provide a video link")]
    MissingVideoUrl,

    /// The video link is not a well-formed absolute URL.
    #[error("Please enter a valid video URL: {0}")]
    InvalidUrl(String),

    /// The URL parsed but does not match a recognized video URL shape.
    #[error("Please enter a valid YouTube URL: {0}")]
    UnrecognizedVideoUrl(String),

    /// The run count is not an integer.
    #[error("Run count must be a whole number, got '{0}'")]
    RunCountNotInteger(String),

    /// The run count is outside the allowed range.
    #[error("Run count must be between {min} and {max}, got {got}")]
    RunCountOutOfRange { got: i64, min: u32, max: u32 },
}
