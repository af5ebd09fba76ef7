use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlobId(u64);

impl BlobId {
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Table of renderable/downloadable byte buffers.
///
/// Each blob belongs to exactly one job. Revoking a handle drops the table's
/// reference; later lookups return `None`.
#[derive(Debug, Default)]
pub struct BlobTable {
    next_id: u64,
    entries: HashMap<BlobId, Arc<[u8]>>,
}

impl BlobTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bytes: Arc<[u8]>) -> BlobId {
        self.next_id += 1;
        let id = BlobId(self.next_id);
        self.entries.insert(id, bytes);
        id
    }

    pub fn get(&self, id: BlobId) -> Option<Arc<[u8]>> {
        self.entries.get(&id).cloned()
    }

    pub fn revoke(&mut self, id: BlobId) -> bool {
        self.entries.remove(&id).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
