use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use crate::analysis::token::Token;
use crate::core::error::{Error, Result};
use crate::core::types::{Document, StoredFields};
use crate::schema::schema::Schema;

/// One document after analysis, before it has an id
#[derive(Debug, Clone)]
pub struct AnalyzedDoc {
    pub fields: Vec<(String, Vec<Token>)>,  // Indexed fields, in field-name order
    pub stored: StoredFields,
}

impl AnalyzedDoc {
    pub fn token_count(&self) -> usize {
        self.fields.iter().map(|(_, tokens)| tokens.len()).sum()
    }
}

/// Run every field of `doc` through the schema. Fails on the first
/// undeclared field, before anything is produced.
pub fn analyze_document(schema: &Schema, doc: &Document) -> Result<AnalyzedDoc> {
    let mut fields = Vec::new();
    let mut stored = StoredFields::new();

    for (name, text) in &doc.fields {
        let entry = schema.field(name)?;
        if let Some(analyzer) = &entry.analyzer {
            fields.push((name.clone(), analyzer.analyze(text).collect()));
        }
        if entry.stored {
            stored.insert(name.clone(), text.clone());
        }
    }

    Ok(AnalyzedDoc { fields, stored })
}

/// Parallel document analyzer for large batches
///
/// Only analysis runs on the pool. Results come back in input order so the
/// writer can hand out ids and merge serially.
pub struct ParallelIndexer {
    pool: ThreadPool,
    pub workers: usize,
    pub threshold: usize,   // Smaller batches stay on the calling thread
}

impl ParallelIndexer {
    pub fn new(workers: usize, threshold: usize) -> Result<Self> {
        let workers = workers.max(1);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("ricerca-analyze-{}", i))
            .build()
            .map_err(|e| Error::InvalidState(format!("cannot start analysis pool: {}", e)))?;

        Ok(ParallelIndexer {
            pool,
            workers,
            threshold,
        })
    }

    pub fn analyze_batch(&self, schema: &Schema, documents: &[Document]) -> Vec<Result<AnalyzedDoc>> {
        if documents.len() < self.threshold {
            return documents.iter().map(|doc| analyze_document(schema, doc)).collect();
        }
        self.pool.install(|| {
            documents
                .par_iter()
                .map(|doc| analyze_document(schema, doc))
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::ErrorKind;

    fn docs(n: usize) -> Vec<Document> {
        (0..n)
            .map(|i| {
                Document::new()
                    .with_field("contenuto", format!("documento numero {}", i))
                    .with_field("nome", format!("doc{}.txt", i))
                    .with_field("path", format!("/tmp/doc{}.txt", i))
            })
            .collect()
    }

    #[test]
    fn test_analyze_document_splits_indexed_and_stored() {
        let schema = Schema::file_documents().unwrap();
        let doc = Document::new()
            .with_field("contenuto", "Il gatto di casa")
            .with_field("path", "/tmp/gatto.txt");
        let analyzed = analyze_document(&schema, &doc).unwrap();

        let contenuto = &analyzed.fields.iter().find(|(f, _)| f == "contenuto").unwrap().1;
        let terms: Vec<&str> = contenuto.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(terms, vec!["gatto", "casa"]);
        assert!(!analyzed.stored.contains_key("contenuto"));
        assert_eq!(analyzed.stored["path"], "/tmp/gatto.txt");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let schema = Schema::file_documents().unwrap();
        let doc = Document::new().with_field("autore", "x");
        assert_eq!(analyze_document(&schema, &doc).unwrap_err().kind(), ErrorKind::UnknownField);
    }

    #[test]
    fn test_parallel_batch_keeps_order() {
        let schema = Schema::file_documents().unwrap();
        let indexer = ParallelIndexer::new(4, 8).unwrap();
        let batch = docs(50);
        let analyzed = indexer.analyze_batch(&schema, &batch);
        assert_eq!(analyzed.len(), 50);
        for (i, result) in analyzed.iter().enumerate() {
            let doc = result.as_ref().unwrap();
            assert_eq!(doc.stored["path"], format!("/tmp/doc{}.txt", i));
        }
    }

    #[test]
    fn test_small_batch_matches_parallel() {
        let schema = Schema::file_documents().unwrap();
        let serial = ParallelIndexer::new(2, 1000).unwrap();
        let parallel = ParallelIndexer::new(2, 1).unwrap();
        let batch = docs(10);
        let a: Vec<usize> = serial.analyze_batch(&schema, &batch).iter().map(|r| r.as_ref().unwrap().token_count()).collect();
        let b: Vec<usize> = parallel.analyze_batch(&schema, &batch).iter().map(|r| r.as_ref().unwrap().token_count()).collect();
        assert_eq!(a, b);
    }
}
