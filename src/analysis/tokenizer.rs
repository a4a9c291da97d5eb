use crate::analysis::token::{Token, TokenStream};
use unicode_segmentation::UnicodeSegmentation;

/// Splits raw text into tokens. Each emitted token occupies one position slot.
pub trait Tokenizer: Send + Sync {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a>;

    fn name(&self) -> &str;
}

/// Unicode word-boundary tokenizer (UAX #29 word runs)
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let max = self.max_token_length;
        // Overlong words keep their slot so later positions stay aligned.
        Box::new(
            text.unicode_word_indices()
                .enumerate()
                .filter(move |(_, (_, word))| word.len() <= max)
                .map(|(position, (offset, word))| {
                    Token::new(word.to_string(), position as u32, offset)
                }),
        )
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// Splits on Unicode whitespace, leaves the pieces untouched
#[derive(Debug, Clone)]
pub struct WhitespaceTokenizer {
    pub max_token_length: usize,
}

impl Default for WhitespaceTokenizer {
    fn default() -> Self {
        WhitespaceTokenizer {
            max_token_length: 255,
        }
    }
}

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        let max = self.max_token_length;
        Box::new(
            text.split_whitespace()
                .enumerate()
                .filter(move |(_, piece)| piece.len() <= max)
                .map(move |(position, piece)| {
                    Token::new(piece.to_string(), position as u32, offset_in(text, piece))
                }),
        )
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Emits the whole input as a single token
#[derive(Debug, Clone, Default)]
pub struct KeywordTokenizer;

impl Tokenizer for KeywordTokenizer {
    fn tokenize<'a>(&'a self, text: &'a str) -> TokenStream<'a> {
        if text.is_empty() {
            return Box::new(std::iter::empty());
        }
        Box::new(std::iter::once(Token::new(text.to_string(), 0, 0)))
    }

    fn name(&self) -> &str {
        "keyword"
    }
}

// `piece` must be a subslice of `text`.
fn offset_in(text: &str, piece: &str) -> usize {
    piece.as_ptr() as usize - text.as_ptr() as usize
}
