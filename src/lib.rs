pub mod core;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod query;
pub mod scoring;
pub mod search;
pub mod writer;
pub mod parallel;
pub mod mvcc;
pub mod storage;
pub mod compression;
pub mod ingest;

pub use crate::analysis::analyzer::{Analyzer, AnalyzerKind};
pub use crate::core::config::Config;
pub use crate::core::database::Index;
pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::stats::{FieldStats, IndexStats};
pub use crate::core::types::{DocId, Document, StoredFields};
pub use crate::ingest::source::{DocumentSource, FileSource, TextSource};
pub use crate::query::ast::Query;
pub use crate::query::parser::{BooleanOperator, QueryParser};
pub use crate::schema::schema::Schema;
pub use crate::search::results::{SearchHit, SearchPage, SearchResults};
pub use crate::search::searcher::Searcher;
pub use crate::writer::batch::{BatchReport, DocumentOutcome};
pub use crate::writer::index_writer::{CommitInfo, IndexWriter};

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                          RICERCA STRUCT ARCHITECTURE                         │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── CORE LAYER ──────────────────────────────────┐
│  ┌────────────────────────────────────────────────────────────────────────┐  │
│  │ struct Index                                                           │  │
│  │ schema: Arc<Schema>              // field → (indexed, stored, analyzer) │  │
│  │ storage: Arc<dyn Storage>        // named blobs, memory or directory    │  │
│  │ snapshots: Arc<SnapshotController> // last committed Snapshot          │  │
│  │ indexer: Arc<ParallelIndexer>    // rayon pool for batch analysis       │  │
│  │ next_doc_id: Arc<AtomicU64>      // monotonic, survives clear()         │  │
│  │ writer_active: Arc<AtomicBool>   // one IndexWriter at a time           │  │
│  └────────────────────────────────────────────────────────────────────────┘  │
└──────────────────────────────────────────────────────────────────────────────┘
                │ writer()                               │ searcher()
                ▼                                        ▼
┌──────────────────────────────┐          ┌──────────────────────────────────┐
│ struct IndexWriter           │          │ struct Searcher                  │
│ • pending_index: Inverted…   │ commit() │ • snapshot: Arc<Snapshot>        │
│ • pending_store: DocumentSt… │ ───────► │ • parser: QueryParser            │
│ • add_document / add_sources │ publish  │ • scorer: Arc<dyn Scorer>        │
│ • commit / rollback / clear  │          │ • search(q, k) → SearchPage      │
└──────────────────────────────┘          └──────────────────────────────────┘
                │                                        │
                ▼                                        ▼
┌──────────────────────────────┐          ┌──────────────────────────────────┐
│ struct Snapshot              │          │ QueryEvaluator                   │
│ • index: InvertedIndex       │          │ • Term → postings × TfIdfScorer  │
│   field → FieldIndex (CoW)   │          │ • And → sorted-merge intersect   │
│   term → PostingList         │          │ • Or  → sorted-merge union       │
│ • store: DocumentStore       │          │ • TopKCollector (score↓, id↑)    │
│ • generation, next_doc_id    │          └──────────────────────────────────┘
└──────────────────────────────┘
                │ codec::save / codec::load
                ▼
┌──────────────────────────────────────────────────────────────────────────────┐
│ postings.bin  header + lz4( fst(field\0term → offset) + vbyte lists )        │
│ stored.bin    header + lz4( bincode Vec<(DocId, StoredFields)> )             │
│ meta.bin      header + lz4( bincode IndexMeta ), written last                │
│ header = magic | version | compression | generation | crc32                  │
└──────────────────────────────────────────────────────────────────────────────┘
*/
