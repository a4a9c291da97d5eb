use std::collections::BTreeMap;
use std::sync::Arc;
use crate::core::error::{Error, Result};
use crate::core::types::{DocId, StoredFields};

/// Append-only map of DocId → stored field values.
///
/// Values sit behind `Arc` so snapshot clones share them.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    docs: BTreeMap<DocId, Arc<StoredFields>>,
}

impl DocumentStore {
    pub fn new() -> Self {
        DocumentStore {
            docs: BTreeMap::new(),
        }
    }

    pub fn put(&mut self, doc_id: DocId, fields: StoredFields) -> Result<()> {
        if self.docs.contains_key(&doc_id) {
            return Err(Error::DuplicateDocument {
                doc_id,
                field: "<stored>".to_string(),
            });
        }
        self.docs.insert(doc_id, Arc::new(fields));
        Ok(())
    }

    pub fn get(&self, doc_id: DocId) -> Result<&StoredFields> {
        self.docs
            .get(&doc_id)
            .map(Arc::as_ref)
            .ok_or(Error::DocumentNotFound(doc_id))
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.docs.contains_key(&doc_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DocId, &StoredFields)> {
        self.docs.iter().map(|(id, fields)| (*id, fields.as_ref()))
    }

    /// Append every entry of `other`. Ids must not overlap.
    pub fn merge(&mut self, other: DocumentStore) -> Result<()> {
        if let Some(id) = other.docs.keys().find(|id| self.docs.contains_key(id)) {
            return Err(Error::DuplicateDocument {
                doc_id: *id,
                field: "<stored>".to_string(),
            });
        }
        self.docs.extend(other.docs);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.docs.clear();
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}
