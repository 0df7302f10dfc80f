//! Photo upload orchestration for site reports.
//!
//! This crate owns the **business logic** of getting a batch of photos
//! from the user's selection into remote storage. It has no UI or
//! transport dependencies: storage is reached through
//! [`PhotoStorage`](sitereport_storage::PhotoStorage) and report
//! persistence through [`ReportSink`].
//!
//! # Pipeline
//!
//! 1. **Add**: accept up to the remaining capacity, thumbnail every file
//! 2. **Compress**: shrink each photo off-thread, one at a time
//! 3. **Upload**: push ready photos with a fixed number of slots
//! 4. **Submit**: persist the report, or delete what was uploaded

pub mod config;
pub mod error;
pub mod events;
pub mod item;
pub mod manager;
pub mod submission;

// Re-export primary types for convenience.
pub use config::UploadConfig;
pub use error::{SubmitError, SubmitProblem};
pub use events::UploadEvent;
pub use manager::{AddOutcome, UploadManager};
pub use submission::{
    NewPhoto, NewReport, ReportSink, SinkFuture, SubmitRequest, check_submission, submit_report,
};
