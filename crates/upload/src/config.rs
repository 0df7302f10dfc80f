use serde::{Deserialize, Serialize};
use sitereport_imaging::CompressionOptions;
use sitereport_protocol::constants::{CONCURRENT_UPLOADS, MAX_PHOTOS};

/// Tunables of the upload engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadConfig {
    /// Maximum number of photos tracked at once.
    pub max_photos: usize,
    /// Maximum number of uploads in flight.
    pub concurrency: usize,
    pub compression: CompressionOptions,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_photos: MAX_PHOTOS,
            concurrency: CONCURRENT_UPLOADS,
            compression: CompressionOptions::default(),
        }
    }
}
