use crate::core::stats::FieldStats;
use crate::index::posting::Posting;

/// Scorer trait
pub trait Scorer: Send + Sync {
    /// Contribution of one posting of a term whose postings list has `doc_freq` entries.
    fn score(&self, posting: &Posting, doc_freq: u32, field_stats: &FieldStats) -> f32;

    fn name(&self) -> &str;
}

/// TF-IDF Scorer
///
/// `tf * (1 + ln(N / df))`, with N the number of documents that indexed the
/// field. The constant keeps a term present in every document scoring above zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct TfIdfScorer;

impl TfIdfScorer {
    pub fn new() -> Self {
        TfIdfScorer
    }

    pub fn idf(doc_freq: u32, total_docs: u64) -> f32 {
        if doc_freq == 0 || total_docs == 0 {
            return 0.0;
        }
        // idf >= 1 even if df > N
        let ratio = (total_docs as f64 / doc_freq as f64).max(1.0);
        (1.0 + ratio.ln()) as f32
    }
}

impl Scorer for TfIdfScorer {
    fn score(&self, posting: &Posting, doc_freq: u32, field_stats: &FieldStats) -> f32 {
        posting.term_freq as f32 * Self::idf(doc_freq, field_stats.doc_count)
    }

    fn name(&self) -> &str {
        "tfidf"
    }
}
