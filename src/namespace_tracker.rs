//! Tracks which namespaces (index names) are known to exist, so callers can
//! skip a redundant `index_exists` round-trip to the index store. Updated
//! on every successful index create and cleared on delete (§3 lifecycle).

use std::collections::HashSet;

use parking_lot::Mutex;

#[derive(Default)]
pub struct NamespaceTracker {
    known: Mutex<HashSet<String>>,
}

impl NamespaceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_created(&self, index: &str) {
        self.known.lock().insert(index.to_string());
    }

    pub fn mark_deleted(&self, index: &str) {
        self.known.lock().remove(index);
    }

    pub fn is_known(&self, index: &str) -> bool {
        self.known.lock().contains(index)
    }
}
