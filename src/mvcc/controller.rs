use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use chrono::{DateTime, Utc};
use crate::core::stats::IndexStats;
use crate::index::inverted::InvertedIndex;
use crate::index::stored::DocumentStore;

/// Committed state of the index at one generation
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub generation: u64,
    pub index: InvertedIndex,
    pub store: DocumentStore,
    pub next_doc_id: u64,                       // First id the next writer hands out
    pub committed_at: Option<DateTime<Utc>>,    // None until the first commit
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            generation: 0,
            index: InvertedIndex::new(),
            store: DocumentStore::new(),
            next_doc_id: 1,
            committed_at: None,
        }
    }

    pub fn num_docs(&self) -> usize {
        self.store.len()
    }

    pub fn stats(&self) -> IndexStats {
        self.index.index_stats(self.store.len())
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Publishes committed snapshots to readers
///
/// Readers clone the current `Arc` and keep it for as long as they like; a
/// publish swaps the pointer, so nobody ever sees a half-applied commit.
pub struct SnapshotController {
    current: RwLock<Arc<Snapshot>>,
    current_version: AtomicU64,
}

impl SnapshotController {
    pub fn new(initial: Snapshot) -> Self {
        let version = initial.generation;
        SnapshotController {
            current: RwLock::new(Arc::new(initial)),
            current_version: AtomicU64::new(version),
        }
    }

    pub fn current_snapshot(&self) -> Arc<Snapshot> {
        self.current.read().clone()
    }

    pub fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        let mut current = self.current.write();
        *current = snapshot.clone();
        self.current_version.store(snapshot.generation, Ordering::Release);
        snapshot
    }

    pub fn current_version(&self) -> u64 {
        self.current_version.load(Ordering::Acquire)
    }
}
