use super::cursor_store::CursorStore;
use crate::error_handling::types::StorageError;
use log::{debug, warn};
use std::sync::Arc;

/// Durable cursor over the site list.
///
/// The stored value is reduced modulo the current site count on every read, so
/// a list that shrank between restarts never yields an out-of-range index. A
/// missing or unreadable record resets the rotation to 0.
pub struct RotationState {
    store: Arc<dyn CursorStore>,
    site_count: usize,
}

impl RotationState {
    /// `site_count` must be non-zero; `SiteList` guarantees this.
    pub fn new(store: Arc<dyn CursorStore>, site_count: usize) -> Self {
        debug_assert!(site_count > 0);
        Self {
            store,
            site_count: site_count.max(1),
        }
    }

    pub fn site_count(&self) -> usize {
        self.site_count
    }

    /// Index of the next site to capture, in `[0, site_count)`.
    pub fn current(&self) -> usize {
        match self.store.load() {
            Ok(Some(value)) => (value % self.site_count as u64) as usize,
            Ok(None) => 0,
            Err(e) => {
                warn!("Rotation cursor unreadable, restarting at 0: {}", e);
                0
            }
        }
    }

    /// Moves the cursor one step forward, wrapping at the end of the list, and
    /// persists it before returning the new index.
    pub fn advance(&self) -> Result<usize, StorageError> {
        let next = (self.current() + 1) % self.site_count;
        self.store.save(next as u64)?;
        debug!("Rotation cursor advanced to {}", next);
        Ok(next)
    }
}
