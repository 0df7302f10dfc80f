//! Locally owned preview references.
//!
//! A [`PreviewHandle`] is the local stand-in for an object URL: the registry
//! keeps the preview bytes alive while the handle exists and frees them when
//! it is dropped. Handles are not `Clone`, so each registered preview is
//! released exactly once, by whoever owns the handle last.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use sitereport_protocol::Payload;
use tracing::trace;

/// Registry of live preview payloads.
#[derive(Clone, Default)]
pub struct PreviewRegistry {
    inner: Arc<Mutex<RegistryInner>>,
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    entries: HashMap<u64, Payload>,
    released: u64,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a preview and returns the handle that owns it.
    pub fn register(&self, payload: Payload) -> PreviewHandle {
        let mut inner = self.inner.lock().unwrap();
        inner.next_id += 1;
        let id = inner.next_id;
        inner.entries.insert(id, payload);
        trace!(preview = id, "preview registered");
        PreviewHandle {
            id,
            registry: Arc::clone(&self.inner),
        }
    }

    /// Resolves a preview id to its payload, if still alive.
    pub fn resolve(&self, id: u64) -> Option<Payload> {
        let inner = self.inner.lock().unwrap();
        inner.entries.get(&id).cloned()
    }

    /// Number of previews currently alive.
    pub fn live_count(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.entries.len()
    }

    /// Number of previews released since the registry was created.
    pub fn released_count(&self) -> u64 {
        let inner = self.inner.lock().unwrap();
        inner.released
    }
}

/// Owning reference to a registered preview. Dropping it frees the preview.
pub struct PreviewHandle {
    id: u64,
    registry: Arc<Mutex<RegistryInner>>,
}

impl PreviewHandle {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewHandle").field("id", &self.id).finish()
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.registry.lock() {
            if inner.entries.remove(&self.id).is_some() {
                inner.released += 1;
                trace!(preview = self.id, "preview released");
            }
        }
    }
}
