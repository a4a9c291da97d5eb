use std::sync::Arc;
use std::time::Instant;
use log::debug;
use crate::core::error::Result;
use crate::core::stats::IndexStats;
use crate::core::types::{DocId, StoredFields};
use crate::ingest::source::PATH_FIELD;
use crate::mvcc::controller::Snapshot;
use crate::query::ast::Query;
use crate::query::parser::QueryParser;
use crate::scoring::scorer::Scorer;
use crate::search::executor::QueryEvaluator;
use crate::search::results::{SearchHit, SearchPage, SearchResults};

/// Read-only view of one committed snapshot
///
/// A searcher never changes under its user: commits made after it was
/// taken are only visible to searchers taken later.
#[derive(Clone)]
pub struct Searcher {
    snapshot: Arc<Snapshot>,
    parser: QueryParser,
    scorer: Arc<dyn Scorer>,
    default_limit: usize,
}

impl Searcher {
    pub(crate) fn new(
        snapshot: Arc<Snapshot>,
        parser: QueryParser,
        scorer: Arc<dyn Scorer>,
        default_limit: usize,
    ) -> Self {
        Searcher {
            snapshot,
            parser,
            scorer,
            default_limit,
        }
    }

    pub fn parse(&self, query: &str) -> Result<Query> {
        self.parser.parse(query)
    }

    /// Parse `query`, rank, and fetch stored fields for the top hits.
    /// `limit` falls back to the configured default.
    pub fn search(&self, query: &str, limit: Option<usize>) -> Result<SearchPage> {
        let start = Instant::now();
        let parsed = self.parser.parse(query)?;
        let results = self.evaluate(&parsed, limit.unwrap_or(self.default_limit));

        let mut hits = Vec::with_capacity(results.hits.len());
        for (i, scored) in results.hits.iter().enumerate() {
            let fields = self.document(scored.doc_id)?.clone();
            hits.push(SearchHit {
                rank: i + 1,
                doc_id: scored.doc_id,
                score: scored.score,
                path: fields.get(PATH_FIELD).cloned(),
                fields,
            });
        }

        let took = start.elapsed();
        debug!("query {:?} -> {}: {} hits in {:?}", query, parsed, results.total_hits, took);
        Ok(SearchPage {
            total_hits: results.total_hits,
            hits,
            took_micros: took.as_micros() as u64,
        })
    }

    /// Rank an already built query, without fetching stored fields.
    pub fn evaluate(&self, query: &Query, k: usize) -> SearchResults {
        QueryEvaluator::new(&self.snapshot.index, self.scorer.as_ref()).evaluate(query, k)
    }

    /// Every document matching `query`, in id order
    pub fn matching_docs(&self, query: &Query) -> Vec<DocId> {
        QueryEvaluator::new(&self.snapshot.index, self.scorer.as_ref()).matching_docs(query)
    }

    pub fn document(&self, doc_id: DocId) -> Result<&StoredFields> {
        self.snapshot.store.get(doc_id)
    }

    pub fn num_docs(&self) -> usize {
        self.snapshot.num_docs()
    }

    pub fn generation(&self) -> u64 {
        self.snapshot.generation
    }

    pub fn stats(&self) -> IndexStats {
        self.snapshot.stats()
    }
}
