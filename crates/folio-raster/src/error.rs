use thiserror::Error;

/// Errors from region rasterization.
#[derive(Debug, Error)]
pub enum RasterError {
    /// The region has no area after padding.
    #[error("empty region ({width} x {height})")]
    EmptyRegion { width: f64, height: f64 },

    /// The pixmap could not be allocated or encoded.
    #[error("encode error: {0}")]
    Encode(String),

    /// A placed image could not be decoded.
    #[error("image error: {0}")]
    Image(String),

    /// An embedded font program could not be parsed.
    #[error("font error: {0}")]
    Font(String),
}

impl From<image::ImageError> for RasterError {
    fn from(err: image::ImageError) -> Self {
        RasterError::Image(err.to_string())
    }
}
