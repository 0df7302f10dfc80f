//! Limits shared between the upload engine and its callers.

/// Maximum number of photos in a single report.
pub const MAX_PHOTOS: usize = 10;

/// Maximum number of uploads in flight at once.
pub const CONCURRENT_UPLOADS: usize = 3;

/// Maximum photo title length, in characters.
pub const TITLE_MAX_CHARS: usize = 200;

/// Maximum photo comment length, in characters.
pub const COMMENT_MAX_CHARS: usize = 1000;

/// Maximum customer feedback length, in characters.
pub const FEEDBACK_MAX_CHARS: usize = 500;

/// MIME type used when a payload carries none, and for every compressed output.
pub const DEFAULT_MIME: &str = "image/jpeg";

/// File extension used when a file name carries no usable one.
pub const DEFAULT_EXTENSION: &str = "jpg";
