use std::collections::HashMap;
use std::sync::Arc;
use crate::analysis::analyzer::{Analyzer, AnalyzerKind};
use crate::core::error::{Error, Result};

/// Field definition with its bound analyzer
#[derive(Debug, Clone)]
pub struct FieldEntry {
    pub name: String,
    pub indexed: bool,
    pub stored: bool,
    pub analyzer: Option<Arc<Analyzer>>,  // Some iff indexed
}

/// Fixed field → pipeline registration table.
///
/// Built once, before any document is indexed. Lookups of undeclared fields
/// fail with `UnknownField`.
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<FieldEntry>,
    by_name: HashMap<String, usize>,
    default_search_fields: Vec<String>,
}

impl Schema {
    pub fn builder() -> SchemaBuilder {
        SchemaBuilder::new()
    }

    /// The file indexer's layout: analyzed content, whitespace-split name, keyword path.
    pub fn file_documents() -> Result<Self> {
        Schema::builder()
            .text_field("contenuto", AnalyzerKind::standard_with_stop_words(Analyzer::italian_stop_words()))
            .stored_text_field("nome", AnalyzerKind::Whitespace)
            .keyword_field("path")
            .default_search_fields(["contenuto", "nome"])
            .build()
    }

    pub fn field(&self, name: &str) -> Result<&FieldEntry> {
        self.by_name
            .get(name)
            .map(|&idx| &self.fields[idx])
            .ok_or_else(|| Error::UnknownField(name.to_string()))
    }

    /// `Ok(None)` for a declared field that is stored but not searchable.
    pub fn analyzer_for(&self, name: &str) -> Result<Option<&Arc<Analyzer>>> {
        Ok(self.field(name)?.analyzer.as_ref())
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldEntry> {
        self.fields.iter()
    }

    pub fn default_search_fields(&self) -> &[String] {
        &self.default_search_fields
    }

    pub fn is_stored(&self, name: &str) -> bool {
        self.field(name).map(|f| f.stored).unwrap_or(false)
    }
}

pub struct SchemaBuilder {
    fields: Vec<(String, bool, bool, Option<AnalyzerKind>)>,
    default_analyzer: AnalyzerKind,
    default_search_fields: Vec<String>,
    max_token_length: usize,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        SchemaBuilder {
            fields: Vec::new(),
            default_analyzer: AnalyzerKind::standard(),
            default_search_fields: Vec::new(),
            max_token_length: 255,
        }
    }

    /// Indexed, not stored
    pub fn text_field(mut self, name: &str, analyzer: AnalyzerKind) -> Self {
        self.fields.push((name.to_string(), true, false, Some(analyzer)));
        self
    }

    /// Indexed and stored
    pub fn stored_text_field(mut self, name: &str, analyzer: AnalyzerKind) -> Self {
        self.fields.push((name.to_string(), true, true, Some(analyzer)));
        self
    }

    /// Indexed with the schema's default analyzer
    pub fn default_text_field(mut self, name: &str, stored: bool) -> Self {
        self.fields.push((name.to_string(), true, stored, None));
        self
    }

    /// Untokenized, indexed and stored
    pub fn keyword_field(mut self, name: &str) -> Self {
        self.fields.push((name.to_string(), true, true, Some(AnalyzerKind::Keyword)));
        self
    }

    /// Retrievable only
    pub fn stored_field(mut self, name: &str) -> Self {
        self.fields.push((name.to_string(), false, true, None));
        self
    }

    pub fn default_analyzer(mut self, analyzer: AnalyzerKind) -> Self {
        self.default_analyzer = analyzer;
        self
    }

    pub fn default_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_search_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn max_token_length(mut self, max_token_length: usize) -> Self {
        self.max_token_length = max_token_length;
        self
    }

    pub fn build(self) -> Result<Schema> {
        let default_analyzer = self.default_analyzer.build(self.max_token_length);
        let mut fields = Vec::with_capacity(self.fields.len());
        let mut by_name = HashMap::new();

        for (name, indexed, stored, kind) in self.fields {
            if by_name.contains_key(&name) {
                return Err(Error::InvalidState(format!("field '{}' declared twice", name)));
            }
            let analyzer = indexed.then(|| match &kind {
                Some(kind) => kind.build(self.max_token_length),
                None => default_analyzer.clone(),
            });
            by_name.insert(name.clone(), fields.len());
            fields.push(FieldEntry { name, indexed, stored, analyzer });
        }

        for name in &self.default_search_fields {
            match by_name.get(name).map(|&idx| &fields[idx]) {
                Some(entry) if entry.indexed => {}
                Some(_) => {
                    return Err(Error::InvalidState(format!(
                        "default search field '{}' is not indexed", name
                    )))
                }
                None => return Err(Error::UnknownField(name.clone())),
            }
        }

        Ok(Schema {
            fields,
            by_name,
            default_search_fields: self.default_search_fields,
        })
    }
}

impl Default for SchemaBuilder {
    fn default() -> Self {
        Self::new()
    }
}
