//! Error types for matrix generation and rendering

use thiserror::Error;

/// Result type alias for caller-facing operations
pub type Result<T> = std::result::Result<T, Error>;

/// Precondition violations reported to the caller.
///
/// Construction failures inside the builder are never surfaced through this type by
/// [`generate`](crate::helper::generate); they are downgraded to the fallback render.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested bitmap size was zero
    #[error("Pixel size must be greater than zero, got {0}")]
    InvalidPixelSize(u32),

    /// The variant name is not one of `standard` or `enhanced`
    #[error("Unsupported variant: {0}")]
    UnsupportedVariant(String),

    /// Building the module grid failed
    #[error("Matrix construction failed: {0}")]
    Build(#[from] BuildError),

    /// Image encoding failed
    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Failures while stamping structural regions into a grid.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildError {
    /// The grid cannot hold three finder patterns and their separators
    #[error("Grid size {size} is too small, minimum is {min}")]
    GridTooSmall { size: usize, min: usize },

    /// The grid side exceeds the largest supported size
    #[error("Grid size {size} is too large, maximum is {max}")]
    GridTooLarge { size: usize, max: usize },
}
