use serde::{Serialize, Deserialize};

/// Token representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,      // The token text
    pub position: u32,     // Tokenizer slot, counted before any filter runs
    pub offset: usize,     // Byte offset in original text
    pub length: usize,     // Token length in bytes (of the raw token)
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        let length = text.len();
        Token {
            text,
            position,
            offset,
            length,
        }
    }
}

/// Lazy, single-use sequence of tokens produced by one `analyze` call.
pub type TokenStream<'a> = Box<dyn Iterator<Item = Token> + 'a>;
