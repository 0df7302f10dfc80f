use serde::{Deserialize, Serialize};

use crate::metadata::PhotoMetadata;

/// Process-local identifier of a tracked photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(uuid::Uuid);

impl ItemId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Lifecycle of a tracked photo.
///
/// `Pending → Compressing → Ready → Uploading → Completed | Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UploadStatus {
    Pending,
    Compressing,
    Ready,
    Uploading,
    Completed,
    Error,
}

impl UploadStatus {
    /// Returns `true` if `next` is the direct successor of `self`.
    pub fn can_transition_to(self, next: UploadStatus) -> bool {
        use UploadStatus::*;
        matches!(
            (self, next),
            (Pending, Compressing)
                | (Compressing, Ready)
                | (Ready, Uploading)
                | (Uploading, Completed)
                | (Uploading, Error)
        )
    }

    /// `Completed` and `Error` never change again.
    pub fn is_terminal(self) -> bool {
        matches!(self, UploadStatus::Completed | UploadStatus::Error)
    }

    /// Items that have entered the upload phase count toward overall progress.
    pub fn counts_toward_progress(self) -> bool {
        matches!(
            self,
            UploadStatus::Uploading | UploadStatus::Completed | UploadStatus::Error
        )
    }

    /// States that allow the report to be submitted.
    pub fn is_submittable(self) -> bool {
        matches!(self, UploadStatus::Ready | UploadStatus::Completed)
    }
}

impl std::fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            UploadStatus::Pending => "pending",
            UploadStatus::Compressing => "compressing",
            UploadStatus::Ready => "ready",
            UploadStatus::Uploading => "uploading",
            UploadStatus::Completed => "completed",
            UploadStatus::Error => "error",
        };
        f.write_str(s)
    }
}

/// Read-only view of one tracked photo, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSnapshot {
    pub id: ItemId,
    pub file_name: String,
    pub size_bytes: u64,
    pub thumbnail_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preview_id: Option<u64>,
    pub metadata: PhotoMetadata,
    pub status: UploadStatus,
    pub progress: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
}
