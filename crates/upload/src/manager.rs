//! The upload manager: owns the tracked photos and drives them through
//! compression and upload.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::join_all;
use sitereport_imaging::{PreviewRegistry, ThumbnailOptions, compress_image, create_thumbnail};
use sitereport_protocol::{ItemId, ItemSnapshot, MetadataPatch, Payload, UploadStatus};
use sitereport_storage::{PhotoStorage, ProgressFn};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::UploadConfig;
use crate::events::UploadEvent;
use crate::item::{ItemStore, UploadItem};

const EVENT_BUFFER: usize = 256;

/// Result of [`UploadManager::add_photos`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddOutcome {
    /// Ids of the accepted photos, in selection order.
    pub added: Vec<ItemId>,
    /// Photos turned away because the collection was full.
    pub dropped: usize,
}

/// Single owner of the tracked photo collection.
///
/// All mutation goes through its methods; the lock guarding the collection
/// is never held across an `.await`.
pub struct UploadManager {
    config: UploadConfig,
    storage: Arc<dyn PhotoStorage>,
    previews: PreviewRegistry,
    store: Arc<Mutex<ItemStore>>,
    events_tx: mpsc::Sender<UploadEvent>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
}

impl UploadManager {
    /// Creates a manager with its own preview registry.
    pub fn new(config: UploadConfig, storage: Arc<dyn PhotoStorage>) -> Self {
        Self::with_previews(config, storage, PreviewRegistry::new())
    }

    /// Creates a manager that registers previews in `previews`.
    pub fn with_previews(
        config: UploadConfig,
        storage: Arc<dyn PhotoStorage>,
        previews: PreviewRegistry,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        Self {
            config,
            storage,
            previews,
            store: Arc::new(Mutex::new(ItemStore::default())),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Registry holding the thumbnails and previews of tracked photos.
    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    fn store(&self) -> MutexGuard<'_, ItemStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: UploadEvent) {
        let _ = self.events_tx.try_send(event);
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Starts tracking `files`, up to the remaining capacity.
    ///
    /// Thumbnails for every accepted file are generated first, then each
    /// photo is compressed in turn. Resolves once every accepted photo that
    /// is still tracked has reached `ready`.
    pub async fn add_photos(&self, files: Vec<Payload>) -> AddOutcome {
        let offered = files.len();
        let remaining = self.config.max_photos.saturating_sub(self.len());
        let accepted: Vec<Payload> = files.into_iter().take(remaining).collect();
        if accepted.is_empty() {
            if offered > 0 {
                info!(offered, "collection full, no photos added");
            }
            return AddOutcome {
                added: Vec::new(),
                dropped: offered,
            };
        }

        let thumbnails = join_all(accepted.iter().map(|payload| {
            create_thumbnail(&self.previews, payload.clone(), ThumbnailOptions::default())
        }))
        .await;

        let added = {
            let mut store = self.store();
            // Capacity is re-checked here: another call may have filled the
            // collection while thumbnails were being generated.
            let room = self.config.max_photos.saturating_sub(store.len());
            let mut added = Vec::with_capacity(room.min(accepted.len()));
            for (payload, (thumbnail, degraded)) in accepted.into_iter().zip(thumbnails).take(room) {
                if degraded {
                    debug!(file = %payload.name, "thumbnail fell back to original");
                }
                let item = UploadItem::new(payload, thumbnail);
                added.push(item.id());
                store.push(item);
            }
            added
        };

        for id in &added {
            self.emit(UploadEvent::Added { id: *id });
        }

        let dropped = offered - added.len();
        if dropped > 0 {
            info!(offered, added = added.len(), dropped, "photo limit reached, extra photos dropped");
        }

        for id in &added {
            self.compress_one(*id).await;
        }

        AddOutcome { added, dropped }
    }

    async fn compress_one(&self, id: ItemId) {
        let (payload, cancel) = {
            let mut store = self.store();
            let Some(item) = store.get_mut(&id) else {
                return;
            };
            if !item.transition(UploadStatus::Compressing) {
                return;
            }
            (item.payload().clone(), item.cancel_token())
        };
        self.emit(UploadEvent::StatusChanged {
            id,
            status: UploadStatus::Compressing,
        });

        let processed = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(item = %id, "compression result discarded, photo removed");
                return;
            }
            processed = compress_image(payload, &self.config.compression) => processed,
        };

        let degraded = processed.is_degraded();
        if let Some(reason) = processed.reason() {
            warn!(item = %id, %reason, "compression failed, uploading original");
        }
        let compressed = processed.into_inner();
        let preview = self.previews.register(compressed.clone());

        let ready = {
            let mut store = self.store();
            match store.get_mut(&id) {
                Some(item) => item.finish_compression(compressed, preview, degraded),
                // Removed meanwhile; the preview handle is released on drop.
                None => false,
            }
        };
        if ready {
            self.emit(UploadEvent::StatusChanged {
                id,
                status: UploadStatus::Ready,
            });
        }
    }

    /// Stops tracking a photo and releases its previews.
    ///
    /// Any compression or upload in flight for it is cancelled. Returns
    /// `false` if the id is not tracked.
    pub fn remove_photo(&self, id: ItemId) -> bool {
        let removed = self.store().remove(&id);
        match removed {
            Some(item) => {
                item.cancel_token().cancel();
                debug!(item = %id, status = %item.status(), "photo removed");
                drop(item);
                self.emit(UploadEvent::Removed { id });
                true
            }
            None => false,
        }
    }

    /// Merges `patch` into a photo's metadata. No-op for unknown ids.
    pub fn update_photo_data(&self, id: ItemId, patch: MetadataPatch) -> bool {
        let mut store = self.store();
        match store.get_mut(&id) {
            Some(item) => {
                item.metadata_mut().apply(patch);
                true
            }
            None => false,
        }
    }

    /// Uploads every photo currently `ready` into `namespace`.
    ///
    /// At most `concurrency` uploads run at once; the next one starts as
    /// soon as a slot frees up. Failures are recorded on the item and never
    /// abort sibling uploads. Resolves with a snapshot of all photos once
    /// every selected one is `completed` or `error`.
    pub async fn upload_all(&self, namespace: &str) -> Vec<ItemSnapshot> {
        let selected: Vec<(ItemId, Payload, CancellationToken)> = self
            .store()
            .iter()
            .filter(|item| item.status() == UploadStatus::Ready)
            .map(|item| (item.id(), item.payload().clone(), item.cancel_token()))
            .collect();

        if selected.is_empty() {
            return self.items();
        }

        info!(
            count = selected.len(),
            slots = self.config.concurrency,
            "uploading photos"
        );

        let slots = Semaphore::new(self.config.concurrency.max(1));
        join_all(selected.into_iter().map(|(id, payload, cancel)| {
            let slots = &slots;
            async move {
                let Ok(_permit) = slots.acquire().await else {
                    return;
                };
                self.upload_one(id, payload, namespace, cancel).await;
            }
        }))
        .await;

        let items = self.items();
        let failed = items
            .iter()
            .filter(|item| item.status == UploadStatus::Error)
            .count();
        if failed > 0 {
            warn!(failed, "some photos failed to upload");
        } else {
            info!("all photos uploaded");
        }
        items
    }

    async fn upload_one(
        &self,
        id: ItemId,
        payload: Payload,
        namespace: &str,
        cancel: CancellationToken,
    ) {
        let started = self
            .store()
            .get_mut(&id)
            .is_some_and(|item| item.start_upload());
        if !started {
            return;
        }
        self.emit(UploadEvent::StatusChanged {
            id,
            status: UploadStatus::Uploading,
        });

        let on_progress: ProgressFn = {
            let store = Arc::clone(&self.store);
            let events = self.events_tx.clone();
            Arc::new(move |pct| {
                let changed = store
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .get_mut(&id)
                    .is_some_and(|item| item.set_progress(pct));
                if changed {
                    let _ = events.try_send(UploadEvent::Progress { id, progress: pct });
                }
            })
        };

        let result = self
            .storage
            .upload(payload, namespace, on_progress, cancel)
            .await;

        let outcome = {
            let mut store = self.store();
            store.get_mut(&id).map(|item| match &result {
                Ok(url) => item.complete(url.clone()).then_some(UploadStatus::Completed),
                Err(e) => item.fail(e.to_string()).then_some(UploadStatus::Error),
            })
        };

        match (outcome, result) {
            (Some(Some(status)), result) => {
                match &result {
                    Ok(url) => debug!(item = %id, %url, "photo uploaded"),
                    Err(e) => warn!(item = %id, error = %e, "photo upload failed"),
                }
                self.emit(UploadEvent::StatusChanged { id, status });
            }
            (Some(None), _) => {}
            (None, Ok(url)) => {
                // Removed while the transfer finished: nothing references
                // the object any more.
                debug!(item = %id, "photo removed during upload, deleting stored copy");
                let urls = [url];
                if let Err(e) = self.storage.delete(&urls).await {
                    warn!(item = %id, error = %e, "failed to delete orphaned upload");
                }
            }
            (None, Err(e)) => {
                debug!(item = %id, error = %e, "upload of removed photo ended");
            }
        }
    }

    /// Deletes the stored copies of every `completed` photo and returns
    /// those photos to `ready`.
    ///
    /// Used as compensation when a later step of a submission fails. The
    /// rolled-back photos no longer reference stored objects, so the next
    /// [`upload_all`](Self::upload_all) sends them again. Storage failures
    /// are logged and swallowed. Returns the ids that were rolled back.
    pub async fn cleanup_uploaded_photos(&self) -> Vec<ItemId> {
        let uploaded: Vec<(ItemId, String)> = self
            .store()
            .iter()
            .filter(|item| item.status() == UploadStatus::Completed)
            .filter_map(|item| Some((item.id(), item.remote_url()?.to_string())))
            .collect();
        if uploaded.is_empty() {
            return Vec::new();
        }

        let urls: Vec<String> = uploaded.iter().map(|(_, url)| url.clone()).collect();
        match self.storage.delete(&urls).await {
            Ok(count) => info!(count, "rolled back uploaded photos"),
            Err(e) => warn!(error = %e, urls = urls.len(), "rollback of uploaded photos failed"),
        }

        // Reset even when the delete failed: the objects may be gone.
        let rolled_back: Vec<ItemId> = {
            let mut store = self.store();
            uploaded
                .into_iter()
                .filter(|(id, url)| {
                    store
                        .get_mut(id)
                        .filter(|item| item.remote_url() == Some(url.as_str()))
                        .is_some_and(|item| item.roll_back())
                })
                .map(|(id, _)| id)
                .collect()
        };
        for id in &rolled_back {
            self.emit(UploadEvent::StatusChanged {
                id: *id,
                status: UploadStatus::Ready,
            });
        }
        rolled_back
    }

    /// Stops tracking every photo, cancelling work in flight.
    pub fn clear(&self) {
        let items = self.store().drain();
        for item in &items {
            item.cancel_token().cancel();
            self.emit(UploadEvent::Removed { id: item.id() });
        }
        if !items.is_empty() {
            debug!(count = items.len(), "photo collection cleared");
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Snapshot of every tracked photo, in selection order.
    pub fn items(&self) -> Vec<ItemSnapshot> {
        self.store().iter().map(UploadItem::snapshot).collect()
    }

    pub fn get(&self, id: ItemId) -> Option<ItemSnapshot> {
        self.store().get(&id).map(UploadItem::snapshot)
    }

    pub fn len(&self) -> usize {
        self.store().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Public URLs of every `completed` photo.
    pub fn completed_urls(&self) -> Vec<String> {
        self.store()
            .iter()
            .filter(|item| item.status() == UploadStatus::Completed)
            .filter_map(|item| item.remote_url().map(str::to_string))
            .collect()
    }

    /// Mean progress of the photos that have entered the upload phase,
    /// rounded to a whole percent. Zero when none has.
    pub fn overall_progress(&self) -> u8 {
        let store = self.store();
        let (sum, count) = store
            .iter()
            .filter(|item| item.status().counts_toward_progress())
            .fold((0u32, 0u32), |(sum, count), item| {
                (sum + u32::from(item.progress()), count + 1)
            });
        if count == 0 {
            return 0;
        }
        (f64::from(sum) / f64::from(count)).round() as u8
    }

    /// `true` when there is at least one photo and all are `ready` or
    /// `completed`.
    pub fn can_submit(&self) -> bool {
        let store = self.store();
        store.len() > 0 && store.iter().all(|item| item.status().is_submittable())
    }

    pub fn is_compressing(&self) -> bool {
        self.any_in(UploadStatus::Compressing)
    }

    pub fn is_uploading(&self) -> bool {
        self.any_in(UploadStatus::Uploading)
    }

    fn any_in(&self, status: UploadStatus) -> bool {
        self.store().iter().any(|item| item.status() == status)
    }
}

impl Drop for UploadManager {
    fn drop(&mut self) {
        let items = self.store().drain();
        for item in &items {
            item.cancel_token().cancel();
        }
    }
}
