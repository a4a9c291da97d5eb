use std::collections::BTreeMap;
use serde::{Serialize, Deserialize};

/// Per-field statistics used for score normalization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub doc_count: u64,       // Documents with at least one slot in this field
    pub total_terms: u64,     // Terms emitted by the analyzer across those documents
}

impl FieldStats {
    pub fn avg_field_length(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.total_terms as f32 / self.doc_count as f32
        }
    }
}

/// Snapshot-wide statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    pub stored_documents: usize,
    pub unique_terms: usize,
    pub fields: BTreeMap<String, FieldStats>,
}

impl IndexStats {
    pub fn field(&self, name: &str) -> FieldStats {
        self.fields.get(name).copied().unwrap_or_default()
    }
}
