use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use crate::compression::compress::CompressionType;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::IndexStats;
use crate::core::types::{DocId, Document};
use crate::index::inverted::InvertedIndex;
use crate::index::stored::DocumentStore;
use crate::ingest::source::DocumentSource;
use crate::mvcc::controller::{Snapshot, SnapshotController};
use crate::parallel::indexer::{analyze_document, AnalyzedDoc, ParallelIndexer};
use crate::schema::schema::Schema;
use crate::storage::codec;
use crate::storage::directory::Storage;
use crate::storage::file_lock::FileLock;
use crate::writer::batch::{BatchReport, DocumentOutcome};

/// Result of a successful commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitInfo {
    pub generation: u64,
    pub added: usize,             // Documents made visible by this commit
    pub total_documents: usize,
    pub committed_at: Option<DateTime<Utc>>,
}

/// Releases the index's single-writer slot when the writer goes away.
pub(crate) struct WriterSlot(Arc<AtomicBool>);

impl WriterSlot {
    pub(crate) fn claim(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| WriterSlot(flag.clone()))
    }
}

impl Drop for WriterSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// The indexing session: the only path that mutates an index.
///
/// Added documents are staged privately and become visible to searchers
/// all at once on [`commit`](Self::commit). Dropping the writer discards
/// whatever was staged.
pub struct IndexWriter {
    schema: Arc<Schema>,
    storage: Arc<dyn Storage>,
    snapshots: Arc<SnapshotController>,
    indexer: Arc<ParallelIndexer>,
    next_doc_id: Arc<AtomicU64>,
    compression: CompressionType,
    pending_index: InvertedIndex,
    pending_store: DocumentStore,
    _process_lock: Option<FileLock>,
    _slot: WriterSlot,
}

impl std::fmt::Debug for IndexWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexWriter").finish_non_exhaustive()
    }
}

impl IndexWriter {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        schema: Arc<Schema>,
        storage: Arc<dyn Storage>,
        snapshots: Arc<SnapshotController>,
        indexer: Arc<ParallelIndexer>,
        next_doc_id: Arc<AtomicU64>,
        compression: CompressionType,
        process_lock: Option<FileLock>,
        slot: WriterSlot,
    ) -> Self {
        IndexWriter {
            schema,
            storage,
            snapshots,
            indexer,
            next_doc_id,
            compression,
            pending_index: InvertedIndex::new(),
            pending_store: DocumentStore::new(),
            _process_lock: process_lock,
            _slot: slot,
        }
    }

    /// Analyze and stage one document, returning its new id.
    ///
    /// Fails with `UnknownField` if the document names a field the schema
    /// does not declare; nothing is staged and no id is used in that case.
    pub fn add_document(&mut self, doc: Document) -> Result<DocId> {
        let analyzed = analyze_document(&self.schema, &doc)?;
        self.stage(analyzed)
    }

    /// Stage a batch. Either every document is staged or, on the first
    /// error, none of them.
    pub fn add_documents(&mut self, docs: Vec<Document>) -> Result<Vec<DocId>> {
        let analyzed = self
            .indexer
            .analyze_batch(&self.schema, &docs)
            .into_iter()
            .collect::<Result<Vec<_>>>()?;
        analyzed.into_iter().map(|doc| self.stage(doc)).collect()
    }

    /// Read and stage documents from `sources`.
    ///
    /// A source whose content cannot be read is skipped, logged, and listed in
    /// the report; the rest of the batch goes on. Any other error fails the
    /// whole batch with nothing staged.
    pub fn add_sources<I, S>(&mut self, sources: I) -> Result<BatchReport>
    where
        I: IntoIterator<Item = S>,
        S: DocumentSource,
    {
        let mut identities = Vec::new();
        let mut reads = Vec::new();
        let mut docs = Vec::new();

        for source in sources {
            let identity = source.identity();
            match source.read() {
                Ok(doc) => {
                    reads.push(Ok(docs.len()));
                    docs.push(doc);
                }
                Err(err) if err.kind() == ErrorKind::SourceRead => {
                    warn!("skipping {}: {}", identity, err);
                    reads.push(Err(err));
                }
                Err(err) => return Err(err),
            }
            identities.push(identity);
        }

        let mut analyzed = self
            .indexer
            .analyze_batch(&self.schema, &docs)
            .into_iter()
            .collect::<Result<Vec<_>>>()?
            .into_iter();

        let mut report = BatchReport::new();
        for (identity, read) in identities.into_iter().zip(reads) {
            let outcome = match read {
                Ok(_) => match analyzed.next() {
                    Some(doc) => DocumentOutcome::Added(self.stage(doc)?),
                    None => return Err(Error::InvalidState("analysis lost a document".to_string())),
                },
                Err(err) => DocumentOutcome::Skipped(err),
            };
            report.push(identity, outcome);
        }

        debug!(
            "batch staged {} documents, skipped {}",
            report.added_count(),
            report.skipped_count()
        );
        Ok(report)
    }

    fn stage(&mut self, doc: AnalyzedDoc) -> Result<DocId> {
        let doc_id = DocId(self.next_doc_id.fetch_add(1, Ordering::AcqRel));
        let token_count = doc.token_count();
        for (field, tokens) in doc.fields {
            self.pending_index.add_document(doc_id, &field, tokens)?;
        }
        self.pending_store.put(doc_id, doc.stored)?;
        debug!("staged document {} ({} tokens)", doc_id, token_count);
        Ok(doc_id)
    }

    /// Persist staged documents and publish them to searchers in one step.
    ///
    /// If persisting fails, the published snapshot and the staged documents
    /// are left as they were, so the commit can be retried.
    pub fn commit(&mut self) -> Result<CommitInfo> {
        let current = self.snapshots.current_snapshot();
        let added = self.pending_store.len();
        if added == 0 {
            return Ok(CommitInfo {
                generation: current.generation,
                added: 0,
                total_documents: current.num_docs(),
                committed_at: current.committed_at,
            });
        }

        let start = Instant::now();
        let mut next = (*current).clone();
        next.index.merge(self.pending_index.clone())?;
        next.store.merge(self.pending_store.clone())?;
        next.generation = current.generation + 1;
        next.next_doc_id = self.next_doc_id.load(Ordering::Acquire);
        next.committed_at = Some(Utc::now());

        codec::save(self.storage.as_ref(), &next, self.compression)?;
        let published = self.snapshots.publish(next);
        self.pending_index.clear();
        self.pending_store.clear();

        info!(
            "committed generation {}: {} new documents, {} total, {:?}",
            published.generation,
            added,
            published.num_docs(),
            start.elapsed()
        );
        Ok(CommitInfo {
            generation: published.generation,
            added,
            total_documents: published.num_docs(),
            committed_at: published.committed_at,
        })
    }

    /// Discard everything staged since the last commit.
    pub fn rollback(&mut self) -> usize {
        let discarded = self.pending_store.len();
        self.pending_index.clear();
        self.pending_store.clear();
        if discarded > 0 {
            info!("rolled back {} staged documents", discarded);
        }
        discarded
    }

    /// Empty the index and the document store, and publish that at once.
    ///
    /// Staged documents are discarded too. Ids keep counting up.
    pub fn clear(&mut self) -> Result<CommitInfo> {
        let current = self.snapshots.current_snapshot();
        let cleared = Snapshot {
            generation: current.generation + 1,
            next_doc_id: self.next_doc_id.load(Ordering::Acquire),
            committed_at: Some(Utc::now()),
            ..Snapshot::empty()
        };

        codec::save(self.storage.as_ref(), &cleared, self.compression)?;
        let published = self.snapshots.publish(cleared);
        self.rollback();
        info!(
            "cleared index ({} documents dropped), generation {}",
            current.num_docs(),
            published.generation
        );
        Ok(CommitInfo {
            generation: published.generation,
            added: 0,
            total_documents: 0,
            committed_at: published.committed_at,
        })
    }

    /// Statistics of the last committed state
    pub fn stats(&self) -> IndexStats {
        self.snapshots.current_snapshot().stats()
    }

    /// Documents staged but not yet committed
    pub fn pending_documents(&self) -> usize {
        self.pending_store.len()
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }
}

impl Drop for IndexWriter {
    fn drop(&mut self) {
        let pending = self.pending_store.len();
        if pending > 0 {
            debug!("writer dropped with {} uncommitted documents", pending);
        }
    }
}
