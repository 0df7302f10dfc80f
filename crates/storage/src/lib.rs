//! Object storage client for report photos.
//!
//! Uploads stream the payload to a Supabase-style storage REST endpoint,
//! reporting byte-level progress, and resolve to the object's public URL.
//! Cleanup resolves public URLs back to object paths and removes them in a
//! single request.
//!
//! The [`PhotoStorage`] trait is the seam the upload engine depends on;
//! [`StorageClient`] is the HTTP implementation.

pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod progress;
pub mod session;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use sitereport_protocol::Payload;
use tokio_util::sync::CancellationToken;

pub use client::StorageClient;
pub use config::StorageConfig;
pub use error::StorageError;
pub use key::{extract_object_path, object_key, sanitize_extension};
pub use progress::ByteProgress;
pub use session::{EnvSession, SessionProvider, StaticSession};

/// Callback receiving upload progress as a percentage (0–100).
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Boxed future returned by [`PhotoStorage`] operations.
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Remote storage for report photos.
///
/// Implemented by [`StorageClient`]; tests substitute in-memory fakes.
pub trait PhotoStorage: Send + Sync {
    /// Uploads `payload` under `namespace` and returns its public URL.
    ///
    /// `on_progress` receives non-decreasing percentages. Cancelling `cancel`
    /// aborts the transfer with [`StorageError::Aborted`].
    fn upload<'a>(
        &'a self,
        payload: Payload,
        namespace: &'a str,
        on_progress: ProgressFn,
        cancel: CancellationToken,
    ) -> StorageFuture<'a, String>;

    /// Removes the objects behind previously returned public URLs.
    ///
    /// URLs that do not resolve to an object path are skipped. Returns the
    /// number of object paths the removal was issued for.
    fn delete<'a>(&'a self, urls: &'a [String]) -> StorageFuture<'a, usize>;
}
