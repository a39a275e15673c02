use thiserror::Error;

#[derive(Debug, Error)]
pub enum EncodeError {
    /// Dimensions which no 24-bit BMP can describe, or a buffer that does
    /// not match them
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
    /// The pixel source was interrupted or delivered an incomplete image
    #[error("pixel source failed: {0}")]
    PixelSource(String),
    /// The output could not be opened; nothing was written to it
    #[error("unable to create output: {0}")]
    Create(#[source] std::io::Error),
    #[error("unable to serialize {what} header: {reason}")]
    Header { what: &'static str, reason: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
