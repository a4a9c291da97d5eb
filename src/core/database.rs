use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use log::info;
use crate::compression::compress::CompressionType;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::core::stats::IndexStats;
use crate::mvcc::controller::{Snapshot, SnapshotController};
use crate::parallel::indexer::ParallelIndexer;
use crate::query::parser::QueryParser;
use crate::schema::schema::Schema;
use crate::scoring::scorer::{Scorer, TfIdfScorer};
use crate::search::searcher::Searcher;
use crate::storage::codec;
use crate::storage::directory::{FileStorage, MemoryStorage, Storage};
use crate::writer::index_writer::{IndexWriter, WriterSlot};

/// An index: schema, storage and the last committed snapshot.
///
/// Hands out one [`IndexWriter`] at a time and any number of [`Searcher`]s.
/// Share it across threads behind an `Arc`.
pub struct Index {
    schema: Arc<Schema>,
    config: Config,
    storage: Arc<dyn Storage>,
    snapshots: Arc<SnapshotController>,
    indexer: Arc<ParallelIndexer>,
    scorer: Arc<dyn Scorer>,
    next_doc_id: Arc<AtomicU64>,
    writer_active: Arc<AtomicBool>,
}

impl Index {
    /// Open with the storage `config` names: a directory, or memory when unset.
    pub fn open(schema: Schema, config: Config) -> Result<Self> {
        let storage: Arc<dyn Storage> = match &config.storage_path {
            Some(path) => Arc::new(FileStorage::open(path)?),
            None => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(schema, config, storage)
    }

    pub fn in_memory(schema: Schema) -> Result<Self> {
        Self::open(schema, Config::in_memory())
    }

    /// Open over any storage, recovering the last committed snapshot if one exists.
    pub fn with_storage(schema: Schema, config: Config, storage: Arc<dyn Storage>) -> Result<Self> {
        let snapshot = match codec::load(storage.as_ref())? {
            Some(snapshot) => {
                check_schema(&schema, &snapshot)?;
                info!(
                    "opened index at generation {} with {} documents",
                    snapshot.generation,
                    snapshot.num_docs()
                );
                snapshot
            }
            None => {
                info!("opened empty index");
                Snapshot::empty()
            }
        };

        let indexer = ParallelIndexer::new(config.worker_threads, config.parallel_threshold)?;

        Ok(Index {
            schema: Arc::new(schema),
            next_doc_id: Arc::new(AtomicU64::new(snapshot.next_doc_id)),
            snapshots: Arc::new(SnapshotController::new(snapshot)),
            indexer: Arc::new(indexer),
            scorer: Arc::new(TfIdfScorer::new()),
            writer_active: Arc::new(AtomicBool::new(false)),
            storage,
            config,
        })
    }

    /// Replace the ranking function used by searchers taken from now on.
    pub fn with_scorer(mut self, scorer: Arc<dyn Scorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// The single writer. Fails with `InvalidState` while another one is alive.
    pub fn writer(&self) -> Result<IndexWriter> {
        let slot = WriterSlot::claim(&self.writer_active)
            .ok_or_else(|| Error::InvalidState("another writer is active".to_string()))?;
        let process_lock = self.storage.writer_lock()?;
        self.catch_up()?;
        let compression = if self.config.compress {
            CompressionType::Lz4
        } else {
            CompressionType::None
        };

        Ok(IndexWriter::new(
            self.schema.clone(),
            self.storage.clone(),
            self.snapshots.clone(),
            self.indexer.clone(),
            self.next_doc_id.clone(),
            compression,
            process_lock,
            slot,
        ))
    }

    /// Reload storage if another handle committed since this one last looked.
    /// Runs with the writer lock held, so storage cannot move underneath.
    fn catch_up(&self) -> Result<()> {
        let current = self.snapshots.current_snapshot();
        let Some(meta) = codec::load_meta(self.storage.as_ref())? else {
            return Ok(());
        };
        if meta.generation == current.generation {
            return Ok(());
        }
        let Some(snapshot) = codec::load(self.storage.as_ref())? else {
            return Ok(());
        };
        check_schema(&self.schema, &snapshot)?;

        self.next_doc_id.fetch_max(snapshot.next_doc_id, Ordering::AcqRel);
        info!(
            "storage moved from generation {} to {}, reloaded {} documents",
            current.generation,
            snapshot.generation,
            snapshot.num_docs()
        );
        self.snapshots.publish(snapshot);
        Ok(())
    }

    /// A searcher over the latest committed snapshot
    pub fn searcher(&self) -> Searcher {
        let parser = QueryParser::new(self.schema.clone())
            .with_default_operator(self.config.default_operator);
        Searcher::new(
            self.snapshots.current_snapshot(),
            parser,
            self.scorer.clone(),
            self.config.default_limit,
        )
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.snapshots.current_version()
    }

    pub fn stats(&self) -> IndexStats {
        self.snapshots.current_snapshot().stats()
    }
}

fn check_schema(schema: &Schema, snapshot: &Snapshot) -> Result<()> {
    for field in snapshot.index.field_names() {
        if schema.field(field).is_err() {
            return Err(Error::InvalidState(format!(
                "persisted field '{}' is not declared in the schema",
                field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;
    use crate::core::types::Document;

    fn doc(content: &str, path: &str) -> Document {
        Document::new()
            .with_field("contenuto", content)
            .with_field("nome", path.rsplit('/').next().unwrap_or(path))
            .with_field("path", path)
    }

    #[test]
    fn test_second_writer_rejected_until_drop() {
        let index = Index::in_memory(Schema::file_documents().unwrap()).unwrap();
        let writer = index.writer().unwrap();
        assert_eq!(index.writer().unwrap_err().kind(), ErrorKind::InvalidState);
        drop(writer);
        assert!(index.writer().is_ok());
    }

    #[test]
    fn test_reopen_over_shared_storage() {
        let storage = MemoryStorage::new();
        {
            let index = Index::with_storage(
                Schema::file_documents().unwrap(),
                Config::default(),
                Arc::new(storage.clone()),
            )
            .unwrap();
            let mut writer = index.writer().unwrap();
            writer.add_document(doc("volpe rossa", "/a.txt")).unwrap();
            writer.commit().unwrap();
        }

        let index = Index::with_storage(
            Schema::file_documents().unwrap(),
            Config::default(),
            Arc::new(storage),
        )
        .unwrap();
        assert_eq!(index.generation(), 1);
        let page = index.searcher().search("volpe", None).unwrap();
        assert_eq!(page.total_hits, 1);

        let mut writer = index.writer().unwrap();
        assert_eq!(writer.add_document(doc("altro", "/b.txt")).unwrap().value(), 2);
    }

    #[test]
    fn test_writer_sees_commits_of_another_handle() {
        let storage = MemoryStorage::new();
        let open = || {
            Index::with_storage(Schema::file_documents().unwrap(), Config::default(), Arc::new(storage.clone()))
                .unwrap()
        };
        let a = open();
        let b = open();

        let mut writer = b.writer().unwrap();
        assert_eq!(writer.add_document(doc("lupo", "/b.txt")).unwrap().value(), 1);
        writer.commit().unwrap();
        drop(writer);

        let mut writer = a.writer().unwrap();
        assert_eq!(a.generation(), 1);
        assert_eq!(writer.add_document(doc("volpe", "/a.txt")).unwrap().value(), 2);
        assert_eq!(writer.commit().unwrap().generation, 2);
        drop(writer);

        let reopened = open();
        assert_eq!(reopened.stats().stored_documents, 2);
        assert_eq!(reopened.searcher().search("lupo", None).unwrap().total_hits, 1);
        assert_eq!(reopened.searcher().search("volpe", None).unwrap().total_hits, 1);
    }

    #[test]
    fn test_two_directory_handles_share_ids() {
        let dir = tempfile::TempDir::new().unwrap();
        let open = || Index::open(Schema::file_documents().unwrap(), Config::persistent(dir.path())).unwrap();
        let a = open();
        let b = open();

        let mut writer = b.writer().unwrap();
        assert!(a.writer().is_err());
        writer.add_document(doc("lupo", "/b.txt")).unwrap();
        writer.commit().unwrap();
        drop(writer);

        let mut writer = a.writer().unwrap();
        assert_eq!(writer.add_document(doc("volpe", "/a.txt")).unwrap().value(), 2);
        writer.commit().unwrap();
        drop(writer);

        let page = open().searcher().search("lupo OR volpe", None).unwrap();
        assert_eq!(page.total_hits, 2);
    }

    #[test]
    fn test_schema_mismatch_on_reopen() {
        let storage = MemoryStorage::new();
        {
            let index = Index::with_storage(
                Schema::file_documents().unwrap(),
                Config::default(),
                Arc::new(storage.clone()),
            )
            .unwrap();
            let mut writer = index.writer().unwrap();
            writer.add_document(doc("volpe", "/a.txt")).unwrap();
            writer.commit().unwrap();
        }

        let narrower = Schema::builder().keyword_field("path").build().unwrap();
        let result = Index::with_storage(narrower, Config::default(), Arc::new(storage));
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }
}
