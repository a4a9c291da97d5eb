use crate::core::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Word(String),
    Field(String),   // `name:` prefix; the value follows as a Word
    And,
    Or,
    LParen,
    RParen,
}

impl TokenKind {
    /// True for tokens that can begin an operand.
    pub fn starts_operand(&self) -> bool {
        matches!(self, TokenKind::Word(_) | TokenKind::Field(_) | TokenKind::LParen)
    }
}

/// A token and the byte offset where it starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lexeme {
    pub kind: TokenKind,
    pub position: usize,
}

pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    pending_field: Option<String>,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || c == '(' || c == ')'
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            pos: 0,
            pending_field: None,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Lexeme>> {
        let mut lexemes = Vec::new();
        while let Some(lexeme) = self.next_lexeme()? {
            lexemes.push(lexeme);
        }
        Ok(lexemes)
    }

    fn next_lexeme(&mut self) -> Result<Option<Lexeme>> {
        // A field value must follow its colon directly and may itself contain ':'
        if let Some(field) = self.pending_field.take() {
            let rest = &self.input[self.pos..];
            if rest.starts_with('"') {
                return self.quoted().map(Some);
            }
            let len = rest.find(is_delimiter).unwrap_or(rest.len());
            if len == 0 {
                return Err(Error::syntax(self.pos, format!("missing value for field '{}'", field)));
            }
            return Ok(Some(self.emit(TokenKind::Word(rest[..len].to_string()), len)));
        }

        let rest = &self.input[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();

        let Some(c) = trimmed.chars().next() else {
            return Ok(None);
        };

        let lexeme = match c {
            '(' => self.emit(TokenKind::LParen, 1),
            ')' => self.emit(TokenKind::RParen, 1),
            ':' => return Err(Error::syntax(self.pos, "missing field name before ':'")),
            '&' if trimmed.starts_with("&&") => self.emit(TokenKind::And, 2),
            '|' if trimmed.starts_with("||") => self.emit(TokenKind::Or, 2),
            '"' => return self.quoted().map(Some),
            _ => {
                let len = trimmed
                    .find(|c: char| is_delimiter(c) || c == ':')
                    .unwrap_or(trimmed.len());
                let word = &trimmed[..len];
                if trimmed[len..].starts_with(':') {
                    self.pending_field = Some(word.to_string());
                    self.emit(TokenKind::Field(word.to_string()), len + 1)
                } else {
                    let kind = match word {
                        "AND" => TokenKind::And,
                        "OR" => TokenKind::Or,
                        _ => TokenKind::Word(word.to_string()),
                    };
                    self.emit(kind, len)
                }
            }
        };
        Ok(Some(lexeme))
    }

    /// `"..."` as one word, quotes stripped. No escapes.
    fn quoted(&mut self) -> Result<Lexeme> {
        let open = self.pos;
        let body = &self.input[open + 1..];
        let close = body
            .find('"')
            .ok_or_else(|| Error::syntax(open, "unterminated quote"))?;
        let text = body[..close].to_string();
        Ok(self.emit(TokenKind::Word(text), close + 2))
    }

    fn emit(&mut self, kind: TokenKind, len: usize) -> Lexeme {
        let lexeme = Lexeme {
            kind,
            position: self.pos,
        };
        self.pos += len;
        lexeme
    }
}
