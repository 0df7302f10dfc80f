//! Image processing for report photos.
//!
//! Two best-effort transforms, both run on the blocking thread pool so the
//! async runtime stays responsive:
//!
//! - **Thumbnails**: a small JPEG preview produced as fast as possible.
//! - **Compression**: downscale and re-encode to a size envelope, always
//!   producing `image/jpeg`.
//!
//! Neither ever fails its caller. A transform that cannot be applied yields
//! [`Processed::Fallback`] carrying the untouched original.

pub mod compress;
pub mod error;
pub mod processed;
pub mod registry;
pub mod thumbnail;

pub use compress::{CompressionOptions, compress_image, compress_parallel, compress_sequential};
pub use error::ImagingError;
pub use processed::Processed;
pub use registry::{PreviewHandle, PreviewRegistry};
pub use thumbnail::{ThumbnailOptions, create_thumbnail, generate_thumbnail};
