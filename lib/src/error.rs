use thiserror::Error;

/// Errors raised by the transformation engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArtError {
    /// A parameter fell outside its documented range. Raised before any work starts.
    #[error("invalid parameter `{name}`: got {value}, expected {expected}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        expected: String,
    },

    /// Pixel access outside the buffer. Indicates a defect in a primitive.
    #[error("pixel ({x}, {y}) is outside a {width}x{height} buffer")]
    OutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },

    #[error("invalid buffer: {reason}")]
    InvalidBuffer { reason: String },

    #[error("region at ({x}, {y}) of size {width}x{height} has no pixels inside the buffer")]
    EmptyRegion {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
}

pub type Result<T> = std::result::Result<T, ArtError>;
