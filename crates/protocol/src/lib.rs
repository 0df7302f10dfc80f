//! Shared data model for the site report photo upload engine.
//!
//! Everything the imaging, storage and upload crates exchange lives here:
//! payloads, photo metadata and its validation rules, the per-item upload
//! status machine, and the JSON shapes the web UI reads.

pub mod constants;
pub mod metadata;
pub mod payload;
pub mod types;

pub use metadata::{MetadataError, MetadataPatch, PhotoMetadata, PhotoType};
pub use payload::Payload;
pub use types::{ItemId, ItemSnapshot, UploadStatus};
