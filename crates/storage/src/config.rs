use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Default bucket for report photos.
pub const DEFAULT_BUCKET: &str = "photos";

/// Where and how photos are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub base_url: String,
    pub bucket: String,
    /// `Cache-Control: max-age` sent with uploads.
    pub cache_control_secs: u32,
    /// Optional project API key, sent as the `apikey` header.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            bucket: DEFAULT_BUCKET.into(),
            cache_control_secs: 3600,
            api_key: None,
        }
    }
}

impl StorageConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Checks that the config can produce request URLs.
    pub fn validate(&self) -> Result<(), StorageError> {
        let base = self.base();
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(StorageError::Config(format!(
                "base URL must be http(s): {:?}",
                self.base_url
            )));
        }
        if self.bucket.is_empty() || self.bucket.contains('/') {
            return Err(StorageError::Config(format!(
                "invalid bucket name: {:?}",
                self.bucket
            )));
        }
        Ok(())
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Endpoint objects are written to.
    pub fn upload_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/{}/{key}", self.base(), self.bucket)
    }

    /// Publicly readable URL of a stored object.
    pub fn public_url(&self, key: &str) -> String {
        format!("{}/storage/v1/object/public/{}/{key}", self.base(), self.bucket)
    }

    /// Endpoint accepting bulk removals.
    pub fn delete_url(&self) -> String {
        format!("{}/storage/v1/object/{}", self.base(), self.bucket)
    }
}
