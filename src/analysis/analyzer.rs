use std::fmt;
use std::sync::Arc;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::extension::ExtensionFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stemmer::{StemLanguage, StemmerFilter};
use crate::analysis::filters::stopword::{StopWordFilter, ITALIAN_STOP_WORDS};
use crate::analysis::token::TokenStream;
use crate::analysis::tokenizer::{KeywordTokenizer, StandardTokenizer, Tokenizer, WhitespaceTokenizer};

/// Text analysis pipeline: one tokenizer, then filters in registration order
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: impl Into<String>, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name: name.into(),
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Lazily analyze `text`. Every call starts a new stream.
    pub fn analyze<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        self.filters
            .iter()
            .fold(self.tokenizer.tokenize(text), |stream, filter| filter.filter(stream))
    }

    /// Convenience for query-time analysis, where only the term texts matter.
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).map(|token| token.text).collect()
    }

    /// Unicode words, lowercased. Stop words match regardless of case.
    pub fn standard(stop_words: &[String], max_token_length: usize) -> Self {
        let mut analyzer = Analyzer::new("standard", Box::new(StandardTokenizer { max_token_length }))
            .add_filter(Box::new(LowercaseFilter));
        if !stop_words.is_empty() {
            let lowered = stop_words.iter().map(|word| word.to_lowercase());
            analyzer = analyzer.add_filter(Box::new(StopWordFilter::new(lowered)));
        }
        analyzer
    }

    pub fn whitespace(max_token_length: usize) -> Self {
        Analyzer::new("whitespace", Box::new(WhitespaceTokenizer { max_token_length }))
    }

    pub fn keyword() -> Self {
        Analyzer::new("keyword", Box::new(KeywordTokenizer))
    }

    pub fn file_name(max_token_length: usize) -> Self {
        Analyzer::new("file_name", Box::new(WhitespaceTokenizer { max_token_length }))
            .add_filter(Box::new(LowercaseFilter))
            .add_filter(Box::new(ExtensionFilter::default()))
    }

    pub fn stemmed(language: StemLanguage, stop_words: &[String], max_token_length: usize) -> Self {
        let mut analyzer = Analyzer::standard(stop_words, max_token_length);
        analyzer.name = format!("stemmed_{:?}", language).to_lowercase();
        analyzer.add_filter(Box::new(StemmerFilter::new(language)))
    }

    pub fn italian_stop_words() -> Vec<String> {
        ITALIAN_STOP_WORDS.iter().map(|w| w.to_string()).collect()
    }
}

impl fmt::Debug for Analyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filters: Vec<&str> = self.filters.iter().map(|filter| filter.name()).collect();
        f.debug_struct("Analyzer")
            .field("name", &self.name)
            .field("tokenizer", &self.tokenizer.name())
            .field("filters", &filters)
            .finish()
    }
}

/// Pipeline variant bound to a field at schema construction time
#[derive(Debug, Clone)]
pub enum AnalyzerKind {
    Standard { stop_words: Vec<String> },
    Whitespace,
    Keyword,
    FileName,
    Stemmed { language: StemLanguage, stop_words: Vec<String> },
    Custom(Arc<Analyzer>),
}

impl AnalyzerKind {
    pub fn standard() -> Self {
        AnalyzerKind::Standard { stop_words: Vec::new() }
    }

    pub fn standard_with_stop_words<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnalyzerKind::Standard {
            stop_words: stop_words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn build(&self, max_token_length: usize) -> Arc<Analyzer> {
        match self {
            AnalyzerKind::Standard { stop_words } => {
                Arc::new(Analyzer::standard(stop_words, max_token_length))
            }
            AnalyzerKind::Whitespace => Arc::new(Analyzer::whitespace(max_token_length)),
            AnalyzerKind::Keyword => Arc::new(Analyzer::keyword()),
            AnalyzerKind::FileName => Arc::new(Analyzer::file_name(max_token_length)),
            AnalyzerKind::Stemmed { language, stop_words } => {
                Arc::new(Analyzer::stemmed(*language, stop_words, max_token_length))
            }
            AnalyzerKind::Custom(analyzer) => analyzer.clone(),
        }
    }
}

impl Default for AnalyzerKind {
    fn default() -> Self {
        AnalyzerKind::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyzed(analyzer: &Analyzer, text: &str) -> Vec<(String, u32)> {
        analyzer.analyze(text).map(|t| (t.text, t.position)).collect()
    }

    #[test]
    fn test_standard_lowercases_and_removes_stop_words() {
        let analyzer = AnalyzerKind::standard_with_stop_words(["il", "la"]).build(255);
        assert_eq!(analyzed(&analyzer, "Il gatto e LA volpe"), vec![
            ("gatto".to_string(), 1),
            ("e".to_string(), 2),
            ("volpe".to_string(), 4),
        ]);
    }

    #[test]
    fn test_stop_words_match_regardless_of_case() {
        let analyzer = AnalyzerKind::standard_with_stop_words(["Il", "LA"]).build(255);
        assert_eq!(analyzer.terms("il gatto IL cane la Volpe"), vec!["gatto", "cane", "volpe"]);

        let stemmed = Analyzer::stemmed(StemLanguage::Italian, &["Il".to_string()], 255);
        assert!(!stemmed.terms("IL gatto").contains(&"il".to_string()));
    }

    #[test]
    fn test_positions_count_removed_slots() {
        let analyzer = AnalyzerKind::standard_with_stop_words(["the"]).build(255);
        let positions: Vec<u32> = analyzer.analyze("the fox the dog").map(|t| t.position).collect();
        assert_eq!(positions, vec![1, 3]);
    }

    #[test]
    fn test_whitespace_is_case_sensitive() {
        let analyzer = AnalyzerKind::Whitespace.build(255);
        assert_eq!(analyzer.terms("Notes.TXT"), vec!["Notes.TXT"]);
    }

    #[test]
    fn test_file_name_pipeline() {
        let analyzer = AnalyzerKind::FileName.build(255);
        assert_eq!(analyzed(&analyzer, "Report.TXT"), vec![
            ("report.txt".to_string(), 0),
            ("report".to_string(), 0),
        ]);
    }

    #[test]
    fn test_stemmed_pipeline() {
        let analyzer = AnalyzerKind::Stemmed {
            language: StemLanguage::English,
            stop_words: vec![],
        }
        .build(255);
        assert_eq!(analyzer.terms("Running foxes"), vec!["run", "fox"]);
    }

    #[test]
    fn test_custom_pipeline_is_shared() {
        let custom = Arc::new(Analyzer::keyword());
        let built = AnalyzerKind::Custom(custom.clone()).build(255);
        assert!(Arc::ptr_eq(&custom, &built));
    }

    #[test]
    fn test_debug_lists_filters() {
        let analyzer = AnalyzerKind::FileName.build(255);
        let debug = format!("{:?}", analyzer);
        assert!(debug.contains("lowercase"));
        assert!(debug.contains("extension"));
    }
}
