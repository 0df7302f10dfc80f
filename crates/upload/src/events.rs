use sitereport_protocol::{ItemId, UploadStatus};

/// Change notification emitted by the [`UploadManager`](crate::UploadManager).
///
/// Events are best-effort: when the receiver lags behind, further events
/// are dropped rather than blocking the engine. Snapshots stay authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadEvent {
    /// A photo was accepted and is now tracked.
    Added { id: ItemId },
    /// A photo moved to a new lifecycle state.
    StatusChanged { id: ItemId, status: UploadStatus },
    /// Upload progress of a photo changed.
    Progress { id: ItemId, progress: u8 },
    /// A photo stopped being tracked.
    Removed { id: ItemId },
}
