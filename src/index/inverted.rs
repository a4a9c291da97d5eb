use std::collections::{BTreeMap, HashMap};
use std::collections::btree_map::Entry as TermEntry;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;
use roaring::RoaringTreemap;
use serde::{Serialize, Deserialize};
use crate::analysis::token::Token;
use crate::core::error::{Error, Result};
use crate::core::stats::{FieldStats, IndexStats};
use crate::core::types::DocId;
use crate::index::posting::{Posting, PostingList};

/// Term representation: an analyzed string scoped to one field
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Term {
    pub field: String,
    pub text: String,
}

impl Term {
    pub fn new(field: impl Into<String>, text: impl Into<String>) -> Self {
        Term {
            field: field.into(),
            text: text.into(),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.text)
    }
}

/// Everything indexed for one field.
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    pub(crate) terms: BTreeMap<String, PostingList>,
    pub(crate) docs: RoaringTreemap,   // Documents that indexed this field
    pub(crate) stats: FieldStats,
}

impl FieldIndex {
    pub fn terms(&self) -> impl Iterator<Item = (&str, &PostingList)> {
        self.terms.iter().map(|(term, list)| (term.as_str(), list))
    }

    pub fn docs(&self) -> &RoaringTreemap {
        &self.docs
    }

    pub fn stats(&self) -> FieldStats {
        self.stats
    }
}

/// Inverted index structure
///
/// Fields are shared copy-on-write, so cloning the index for a new snapshot
/// only copies the fields a commit actually touches.
#[derive(Debug, Clone, Default)]
pub struct InvertedIndex {
    fields: HashMap<String, Arc<FieldIndex>>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        InvertedIndex {
            fields: HashMap::new(),
        }
    }

    /// Index the analyzed tokens of one document field.
    ///
    /// Each (doc, field) pair can be indexed once; a repeat fails with
    /// `DuplicateDocument` and leaves the index untouched.
    pub fn add_document<I>(&mut self, doc_id: DocId, field: &str, tokens: I) -> Result<()>
    where
        I: IntoIterator<Item = Token>,
    {
        if self.contains(field, doc_id) {
            return Err(Error::DuplicateDocument {
                doc_id,
                field: field.to_string(),
            });
        }

        let mut term_positions: BTreeMap<String, Vec<u32>> = BTreeMap::new();
        let mut token_count = 0u64;

        // Group tokens by term
        for token in tokens {
            token_count += 1;
            term_positions.entry(token.text)
                .or_default()
                .push(token.position);
        }

        let entry = Arc::make_mut(self.fields.entry(field.to_string()).or_default());
        for (term, positions) in term_positions {
            entry.terms
                .entry(term)
                .or_default()
                .add_posting(Posting::new(doc_id, positions));
        }
        entry.docs.insert(doc_id.value());
        entry.stats.doc_count += 1;
        entry.stats.total_terms += token_count;

        Ok(())
    }

    pub fn contains(&self, field: &str, doc_id: DocId) -> bool {
        self.fields
            .get(field)
            .is_some_and(|f| f.docs.contains(doc_id.value()))
    }

    pub fn postings(&self, field: &str, term: &str) -> Option<&PostingList> {
        self.fields.get(field)?.terms.get(term)
    }

    pub fn doc_freq(&self, field: &str, term: &str) -> u32 {
        self.postings(field, term).map_or(0, |list| list.doc_freq())
    }

    /// Terms of `field` in lexicographic order
    pub fn terms<'a>(&'a self, field: &str) -> Box<dyn Iterator<Item = &'a str> + 'a> {
        match self.fields.get(field) {
            Some(index) => Box::new(index.terms.keys().map(String::as_str)),
            None => Box::new(std::iter::empty()),
        }
    }

    pub fn field(&self, field: &str) -> Option<&FieldIndex> {
        self.fields.get(field).map(Arc::as_ref)
    }

    /// Field names in sorted order
    pub fn field_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.fields.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn stats(&self, field: &str) -> FieldStats {
        self.fields.get(field).map(|f| f.stats).unwrap_or_default()
    }

    pub fn unique_terms(&self) -> usize {
        self.fields.values().map(|f| f.terms.len()).sum()
    }

    pub fn index_stats(&self, stored_documents: usize) -> IndexStats {
        IndexStats {
            stored_documents,
            unique_terms: self.unique_terms(),
            fields: self.fields
                .iter()
                .map(|(name, f)| (name.clone(), f.stats))
                .collect(),
        }
    }

    /// Fold another index into this one. Used when a writer commits its
    /// staged documents; both sides must hold disjoint document ids.
    pub fn merge(&mut self, other: InvertedIndex) -> Result<()> {
        for (name, incoming) in &other.fields {
            let overlap = self.fields.get(name).and_then(|f| (&f.docs & &incoming.docs).min());
            if let Some(doc) = overlap {
                return Err(Error::DuplicateDocument {
                    doc_id: DocId(doc),
                    field: name.clone(),
                });
            }
        }

        for (name, incoming) in other.fields {
            let target = match self.fields.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                    continue;
                }
                Entry::Occupied(slot) => Arc::make_mut(slot.into_mut()),
            };
            let incoming = Arc::unwrap_or_clone(incoming);
            for (term, list) in incoming.terms {
                match target.terms.entry(term) {
                    TermEntry::Vacant(slot) => {
                        slot.insert(list);
                    }
                    TermEntry::Occupied(mut slot) => {
                        for posting in list.into_postings() {
                            slot.get_mut().add_posting(posting);
                        }
                    }
                }
            }
            target.docs |= incoming.docs;
            target.stats.doc_count += incoming.stats.doc_count;
            target.stats.total_terms += incoming.stats.total_terms;
        }
        Ok(())
    }

    /// Used by the codec when restoring a persisted field.
    pub(crate) fn insert_field(&mut self, name: String, field: FieldIndex) {
        self.fields.insert(name, Arc::new(field));
    }

    pub fn clear(&mut self) {
        self.fields.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(words: &[&str]) -> Vec<Token> {
        words
            .iter()
            .enumerate()
            .map(|(i, w)| Token::new(w.to_string(), i as u32, 0))
            .collect()
    }

    #[test]
    fn test_add_document_groups_positions() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(1), "body", tokens(&["fox", "dog", "fox"])).unwrap();

        let fox = index.postings("body", "fox").unwrap();
        assert_eq!(fox.len(), 1);
        assert_eq!(fox.postings()[0].positions, vec![0, 2]);
        assert_eq!(fox.postings()[0].term_freq, 2);

        let stats = index.stats("body");
        assert_eq!(stats.doc_count, 1);
        assert_eq!(stats.total_terms, 3);
    }

    #[test]
    fn test_terms_are_field_scoped() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(1), "title", tokens(&["rust"])).unwrap();
        assert!(index.postings("body", "rust").is_none());
        assert_eq!(index.doc_freq("title", "rust"), 1);
    }

    #[test]
    fn test_duplicate_add_leaves_index_unchanged() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(7), "body", tokens(&["alpha"])).unwrap();
        let err = index.add_document(DocId(7), "body", tokens(&["beta"])).unwrap_err();
        assert!(matches!(err, Error::DuplicateDocument { doc_id: DocId(7), .. }));
        assert!(index.postings("body", "beta").is_none());
        assert_eq!(index.stats("body").doc_count, 1);
    }

    #[test]
    fn test_field_without_tokens_still_counts() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(1), "body", Vec::new()).unwrap();
        assert!(index.contains("body", DocId(1)));
        assert_eq!(index.stats("body").doc_count, 1);
        assert_eq!(index.unique_terms(), 0);
    }

    #[test]
    fn test_terms_sorted() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(1), "body", tokens(&["pear", "apple", "fig"])).unwrap();
        let terms: Vec<&str> = index.terms("body").collect();
        assert_eq!(terms, vec!["apple", "fig", "pear"]);
        assert_eq!(index.terms("missing").count(), 0);
    }

    #[test]
    fn test_clone_is_isolated() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(1), "body", tokens(&["one"])).unwrap();
        let snapshot = index.clone();
        index.add_document(DocId(2), "body", tokens(&["one"])).unwrap();
        assert_eq!(snapshot.doc_freq("body", "one"), 1);
        assert_eq!(index.doc_freq("body", "one"), 2);
    }

    #[test]
    fn test_merge_combines_staged_documents() {
        let mut committed = InvertedIndex::new();
        committed.add_document(DocId(1), "body", tokens(&["one"])).unwrap();

        let mut staged = InvertedIndex::new();
        staged.add_document(DocId(2), "body", tokens(&["one", "two"])).unwrap();
        staged.add_document(DocId(2), "title", tokens(&["two"])).unwrap();

        committed.merge(staged).unwrap();
        assert_eq!(committed.doc_freq("body", "one"), 2);
        assert_eq!(committed.doc_freq("title", "two"), 1);
        assert_eq!(committed.stats("body").total_terms, 3);
        assert_eq!(committed.index_stats(2).unique_terms, 3);
    }

    #[test]
    fn test_merge_rejects_overlapping_ids() {
        let mut committed = InvertedIndex::new();
        committed.add_document(DocId(1), "body", tokens(&["one"])).unwrap();
        let mut staged = InvertedIndex::new();
        staged.add_document(DocId(1), "body", tokens(&["two"])).unwrap();

        assert!(committed.merge(staged).is_err());
        assert!(committed.postings("body", "two").is_none());
    }

    #[test]
    fn test_clear() {
        let mut index = InvertedIndex::new();
        index.add_document(DocId(1), "body", tokens(&["one"])).unwrap();
        index.clear();
        assert!(index.is_empty());
        assert_eq!(index.stats("body"), FieldStats::default());
    }
}
