//! Imaging error types.

/// Reasons a transform could not be applied.
///
/// These never reach callers of the public transforms as errors; they are
/// rendered into [`Processed::Fallback`](crate::Processed) reasons and logged.
#[derive(Debug, thiserror::Error)]
pub enum ImagingError {
    #[error("decode failed: {0}")]
    Decode(#[source] image::ImageError),

    #[error("encode failed: {0}")]
    Encode(#[source] image::ImageError),

    #[error("empty payload")]
    Empty,

    #[error("worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}
