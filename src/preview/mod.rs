//! Ephemeral preview handles.
//!
//! A [`PreviewHandle`] is the pipeline's equivalent of an object URL: a short
//! lived reference a display layer can resolve to renderable bytes. Handles are
//! not `Clone`, and [`PreviewRegistry::release`] consumes them, so one handle
//! value can be released at most once. The registry still checks its own
//! bookkeeping and reports defects instead of panicking.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::core::{ItemId, SourceFile};
use crate::utils::ResourceError;

/// Live reference to an item's preview bytes.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewHandle {
    key: Uuid,
    item: ItemId,
}

impl PreviewHandle {
    pub fn item(&self) -> ItemId {
        self.item
    }

    /// URL-style token a renderer can use to look the preview up.
    pub fn url(&self) -> String {
        format!("preview://{}", self.key)
    }
}

struct PreviewEntry {
    item: ItemId,
    bytes: Arc<[u8]>,
}

#[derive(Default)]
struct Live {
    entries: HashMap<Uuid, PreviewEntry>,
    /// Owning item of each live handle
    by_item: HashMap<ItemId, Uuid>,
}

/// Tracks every live preview handle.
///
/// Shared behind an `Arc` so observers can check outstanding handles while a
/// session owns the items.
#[derive(Default)]
pub struct PreviewRegistry {
    live: Mutex<Live>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the single preview handle for `item`.
    pub fn allocate(
        &self,
        item: ItemId,
        source: &SourceFile,
    ) -> Result<PreviewHandle, ResourceError> {
        let mut live = self.live.lock();
        if live.by_item.contains_key(&item) {
            warn!("Refusing second preview allocation for item {}", item);
            return Err(ResourceError::AlreadyAllocated(item));
        }

        let key = Uuid::new_v4();
        live.by_item.insert(item, key);
        live.entries.insert(
            key,
            PreviewEntry {
                item,
                bytes: source.shared_bytes(),
            },
        );
        debug!("Preview allocated for '{}' ({} live)", source.name(), live.entries.len());

        Ok(PreviewHandle { key, item })
    }

    /// Releases `handle`; the handle is consumed either way.
    pub fn release(&self, handle: PreviewHandle) -> Result<(), ResourceError> {
        let mut live = self.live.lock();
        match live.entries.remove(&handle.key) {
            Some(entry) => {
                live.by_item.remove(&entry.item);
                debug!("Preview released for item {} ({} live)", handle.item, live.entries.len());
                Ok(())
            }
            None => {
                warn!("Release of unknown preview handle {}", handle.url());
                Err(ResourceError::NotAllocated(handle.url()))
            }
        }
    }

    /// Bytes behind a live handle.
    pub fn resolve(&self, handle: &PreviewHandle) -> Option<Arc<[u8]>> {
        self.live
            .lock()
            .entries
            .get(&handle.key)
            .map(|entry| Arc::clone(&entry.bytes))
    }

    /// Number of handles allocated and not yet released.
    pub fn outstanding(&self) -> usize {
        self.live.lock().entries.len()
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}
