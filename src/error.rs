use thiserror::Error;

pub type Result<T> = std::result::Result<T, PatternError>;

/// Structural failures surfaced to the caller.
///
/// Everything else (out-of-bounds coordinates, mutations on a locked layer,
/// a malformed stored cell) degrades in place and never aborts the larger
/// operation.
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("Image decode error: {0}")]
    Decode(String),

    #[error("Conversion produced no usable colors")]
    EmptyPalette,

    #[error("Layer limit reached (max {max})")]
    LayerLimit { max: usize },

    #[error("Cannot delete the last remaining layer")]
    LastLayer,
}
