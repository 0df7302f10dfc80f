//! Tracked photos and the collection that owns them.

use sitereport_imaging::PreviewHandle;
use sitereport_protocol::{ItemId, ItemSnapshot, Payload, PhotoMetadata, UploadStatus};
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// One selected photo and its lifecycle state.
///
/// Only the [`UploadManager`](crate::UploadManager) mutates items; everyone
/// else sees [`ItemSnapshot`]s.
#[derive(Debug)]
pub struct UploadItem {
    id: ItemId,
    payload: Payload,
    thumbnail: PreviewHandle,
    preview: Option<PreviewHandle>,
    metadata: PhotoMetadata,
    status: UploadStatus,
    progress: u8,
    remote_url: Option<String>,
    error: Option<String>,
    degraded: bool,
    cancel: CancellationToken,
}

impl UploadItem {
    pub(crate) fn new(payload: Payload, thumbnail: PreviewHandle) -> Self {
        Self {
            id: ItemId::new(),
            payload,
            thumbnail,
            preview: None,
            metadata: PhotoMetadata::default(),
            status: UploadStatus::Pending,
            progress: 0,
            remote_url: None,
            error: None,
            degraded: false,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn metadata(&self) -> &PhotoMetadata {
        &self.metadata
    }

    pub fn remote_url(&self) -> Option<&str> {
        self.remote_url.as_deref()
    }

    pub(crate) fn metadata_mut(&mut self) -> &mut PhotoMetadata {
        &mut self.metadata
    }

    pub(crate) fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Moves to `next` if it directly follows the current state.
    pub(crate) fn transition(&mut self, next: UploadStatus) -> bool {
        if !self.status.can_transition_to(next) {
            warn!(item = %self.id, from = %self.status, to = %next, "rejected status transition");
            return false;
        }
        self.status = next;
        true
    }

    /// Swaps in the compressed payload and its preview, marking the item ready.
    pub(crate) fn finish_compression(
        &mut self,
        payload: Payload,
        preview: PreviewHandle,
        degraded: bool,
    ) -> bool {
        if !self.transition(UploadStatus::Ready) {
            return false;
        }
        self.payload = payload;
        self.preview = Some(preview);
        self.degraded = degraded;
        self.progress = 0;
        true
    }

    pub(crate) fn start_upload(&mut self) -> bool {
        if !self.transition(UploadStatus::Uploading) {
            return false;
        }
        self.progress = 0;
        true
    }

    /// Records upload progress. Ignored outside `uploading` and never
    /// moves backwards.
    pub(crate) fn set_progress(&mut self, progress: u8) -> bool {
        let progress = progress.min(100);
        if self.status != UploadStatus::Uploading || progress <= self.progress {
            return false;
        }
        self.progress = progress;
        true
    }

    pub(crate) fn complete(&mut self, url: String) -> bool {
        if !self.transition(UploadStatus::Completed) {
            return false;
        }
        self.progress = 100;
        self.remote_url = Some(url);
        true
    }

    /// Returns a completed item to `ready` after its stored object was
    /// deleted. The next upload pass sends it again.
    pub(crate) fn roll_back(&mut self) -> bool {
        if self.status != UploadStatus::Completed {
            return false;
        }
        self.status = UploadStatus::Ready;
        self.progress = 0;
        self.remote_url = None;
        true
    }

    /// Marks the upload failed. Progress keeps its last observed value.
    pub(crate) fn fail(&mut self, detail: String) -> bool {
        if !self.transition(UploadStatus::Error) {
            return false;
        }
        self.error = Some(detail);
        true
    }

    pub fn snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            file_name: self.payload.name.clone(),
            size_bytes: self.payload.len() as u64,
            thumbnail_id: self.thumbnail.id(),
            preview_id: self.preview.as_ref().map(PreviewHandle::id),
            metadata: self.metadata.clone(),
            status: self.status,
            progress: self.progress,
            remote_url: self.remote_url.clone(),
            error: self.error.clone(),
            degraded: self.degraded,
        }
    }
}

/// Insertion-ordered collection of items with unique ids.
#[derive(Debug, Default)]
pub(crate) struct ItemStore {
    items: Vec<UploadItem>,
}

impl ItemStore {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UploadItem> {
        self.items.iter()
    }

    pub fn push(&mut self, item: UploadItem) {
        debug_assert!(self.get(&item.id).is_none());
        self.items.push(item);
    }

    pub fn get(&self, id: &ItemId) -> Option<&UploadItem> {
        self.items.iter().find(|item| item.id == *id)
    }

    pub fn get_mut(&mut self, id: &ItemId) -> Option<&mut UploadItem> {
        self.items.iter_mut().find(|item| item.id == *id)
    }

    pub fn remove(&mut self, id: &ItemId) -> Option<UploadItem> {
        let idx = self.items.iter().position(|item| item.id == *id)?;
        Some(self.items.remove(idx))
    }

    pub fn drain(&mut self) -> Vec<UploadItem> {
        std::mem::take(&mut self.items)
    }
}
