use std::collections::BinaryHeap;
use std::cmp::Ordering;
use std::time::Duration;
use crate::core::types::{DocId, StoredFields};

/// Search results container
#[derive(Debug, Clone, Default)]
pub struct SearchResults {
    pub hits: Vec<ScoredDoc>,
    pub total_hits: usize,   // Every matching document, not just the kept ones
    pub max_score: f32,
    pub took_micros: u64,
}

/// Document with relevance score
#[derive(Debug, Clone, Copy)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

impl ScoredDoc {
    pub fn new(doc_id: DocId, score: f32) -> Self {
        ScoredDoc { doc_id, score }
    }
}

// Ordering is rank order: Less means ranked earlier (higher score, then lower id).
impl PartialEq for ScoredDoc {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDoc {}

impl PartialOrd for ScoredDoc {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDoc {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Top-K collector for efficient result collection
///
/// The heap's maximum is the worst-ranked document kept, so it is the one
/// evicted when a better candidate arrives.
pub struct TopKCollector {
    pub heap: BinaryHeap<ScoredDoc>,
    pub k: usize,
    pub total_collected: usize,  // Track total documents processed
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k.min(1024) + 1),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, doc: ScoredDoc) {
        self.total_collected += 1;

        if self.heap.len() < self.k {
            self.heap.push(doc);
        } else if let Some(mut worst) = self.heap.peek_mut() {
            if doc < *worst {
                *worst = doc;
            }
        }
    }

    pub fn max_score(&self) -> f32 {
        self.heap.iter().map(|doc| doc.score).fold(0.0, f32::max)
    }

    /// Kept documents in rank order
    pub fn into_sorted(self) -> Vec<ScoredDoc> {
        self.heap.into_sorted_vec()
    }

    pub fn into_results(self, took: Duration) -> SearchResults {
        let total_hits = self.total_collected;
        let max_score = self.max_score();
        SearchResults {
            hits: self.into_sorted(),
            total_hits,
            max_score,
            took_micros: took.as_micros() as u64,
        }
    }
}

/// One row of a result page
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub rank: usize,              // 1-based
    pub doc_id: DocId,
    pub score: f32,
    pub path: Option<String>,     // Stored "path" field, when the schema stores one
    pub fields: StoredFields,
}

/// What the query boundary hands back to a caller
#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub total_hits: usize,
    pub hits: Vec<SearchHit>,
    pub took_micros: u64,
}

impl SearchPage {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
