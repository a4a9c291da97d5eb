use serde::{Serialize, Deserialize};
use crate::core::types::DocId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Term frequency in document, always >= 1
    pub positions: Vec<u32>,  // Token positions, ascending
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        Posting {
            doc_id,
            term_freq: positions.len() as u32,
            positions,
        }
    }
}

/// Posting list for one (field, term)
/// Note: Sorted by doc_id with no duplicates; evaluators rely on this for linear merges
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostingList {
    postings: Vec<Posting>,
}

impl PostingList {
    pub fn new() -> Self {
        PostingList {
            postings: Vec::new(),
        }
    }

    /// Build from postings in any order. Returns None when a doc_id repeats.
    pub fn from_postings(mut postings: Vec<Posting>) -> Option<Self> {
        postings.sort_by_key(|p| p.doc_id);
        if postings.windows(2).any(|w| w[0].doc_id == w[1].doc_id) {
            return None;
        }
        Some(PostingList { postings })
    }

    /// Insert keeping doc_id order. Returns false (and changes nothing) if
    /// the document already has a posting here.
    pub fn add_posting(&mut self, posting: Posting) -> bool {
        // Ids are handed out in increasing order, so this is almost always a push.
        if self.postings.last().is_none_or(|last| last.doc_id < posting.doc_id) {
            self.postings.push(posting);
            return true;
        }
        match self.postings.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(_) => false,
            Err(pos) => {
                self.postings.insert(pos, posting);
                true
            }
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn into_postings(self) -> Vec<Posting> {
        self.postings
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.postings.iter().map(|p| p.term_freq as u64).sum()
    }
}

impl<'a> IntoIterator for &'a PostingList {
    type Item = &'a Posting;
    type IntoIter = std::slice::Iter<'a, Posting>;

    fn into_iter(self) -> Self::IntoIter {
        self.postings.iter()
    }
}
