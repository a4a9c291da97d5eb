use crate::core::error::Error;
use crate::core::types::DocId;

/// What happened to one source of a batch
#[derive(Debug)]
pub enum DocumentOutcome {
    Added(DocId),
    Skipped(Error),    // Content could not be read; the document is absent
}

impl DocumentOutcome {
    pub fn doc_id(&self) -> Option<DocId> {
        match self {
            DocumentOutcome::Added(doc_id) => Some(*doc_id),
            DocumentOutcome::Skipped(_) => None,
        }
    }
}

/// Per-source outcomes of `IndexWriter::add_sources`, in input order
#[derive(Debug, Default)]
pub struct BatchReport {
    pub outcomes: Vec<(String, DocumentOutcome)>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, identity: String, outcome: DocumentOutcome) {
        self.outcomes.push((identity, outcome));
    }

    pub fn added(&self) -> impl Iterator<Item = (&str, DocId)> {
        self.outcomes
            .iter()
            .filter_map(|(identity, outcome)| outcome.doc_id().map(|id| (identity.as_str(), id)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.outcomes.iter().filter_map(|(identity, outcome)| match outcome {
            DocumentOutcome::Skipped(err) => Some((identity.as_str(), err)),
            DocumentOutcome::Added(_) => None,
        })
    }

    pub fn added_count(&self) -> usize {
        self.added().count()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped().count()
    }

    pub fn is_complete(&self) -> bool {
        self.skipped_count() == 0
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}
