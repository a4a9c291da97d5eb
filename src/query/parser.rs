use std::sync::Arc;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};
use crate::query::ast::Query;
use crate::query::lexer::{Lexeme, Lexer, TokenKind};
use crate::schema::schema::Schema;

/// How adjacent clauses without an explicit keyword are joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanOperator {
    And,
    Or,
}

impl Default for BooleanOperator {
    fn default() -> Self {
        BooleanOperator::And
    }
}

/// Query parser for converting query strings to a [`Query`] tree
///
/// Clause text is run through the analyzer bound to the target field, so
/// query terms are normalized exactly like indexed terms.
/// Examples (default fields `[body]`, default operator AND):
/// - `rust programming` -> `(body:rust AND body:programming)`
/// - `rust OR go` -> `(body:rust OR body:go)`
/// - `title:rust (web || cli)` -> `(title:rust AND (body:web OR body:cli))`
#[derive(Debug, Clone)]
pub struct QueryParser {
    schema: Arc<Schema>,
    pub default_operator: BooleanOperator,
}

impl QueryParser {
    pub fn new(schema: Arc<Schema>) -> Self {
        QueryParser {
            schema,
            default_operator: BooleanOperator::And,
        }
    }

    pub fn with_default_operator(mut self, operator: BooleanOperator) -> Self {
        self.default_operator = operator;
        self
    }

    /// Parse against the schema's default search fields.
    pub fn parse(&self, input: &str) -> Result<Query> {
        self.parse_with_fields(input, self.schema.default_search_fields())
    }

    /// Parse with bare clauses expanded over `default_fields`.
    pub fn parse_with_fields<S: AsRef<str>>(&self, input: &str, default_fields: &[S]) -> Result<Query> {
        for field in default_fields {
            self.schema.field(field.as_ref())?;
        }

        let lexemes = Lexer::new(input).tokenize()?;
        if lexemes.is_empty() {
            return Ok(Query::match_none());
        }

        let mut parser = Parser {
            lexemes,
            cursor: 0,
            end: input.len(),
            schema: &self.schema,
            default_fields: default_fields.iter().map(AsRef::as_ref).collect(),
            default_operator: self.default_operator,
            depth: 0,
        };

        let query = parser.or_expr()?;
        if let Some(lexeme) = parser.peek() {
            return Err(Error::syntax(lexeme.position, "unmatched ')'"));
        }
        Ok(query.unwrap_or_else(Query::match_none))
    }
}

/// Recursive descent over lexemes. `None` from a rule means every clause in
/// it analyzed to nothing (stop words, punctuation) and was dropped.
/// Deepest parenthesis nesting accepted
const MAX_NESTING: usize = 128;

struct Parser<'p> {
    lexemes: Vec<Lexeme>,
    cursor: usize,
    end: usize,
    schema: &'p Schema,
    default_fields: Vec<&'p str>,
    default_operator: BooleanOperator,
    depth: usize,
}

impl<'p> Parser<'p> {
    fn peek(&self) -> Option<&Lexeme> {
        self.lexemes.get(self.cursor)
    }

    fn peek_kind(&self) -> Option<&TokenKind> {
        self.peek().map(|l| &l.kind)
    }

    fn advance(&mut self) -> Option<Lexeme> {
        let lexeme = self.lexemes.get(self.cursor).cloned();
        if lexeme.is_some() {
            self.cursor += 1;
        }
        lexeme
    }

    fn implicit(&self, operator: BooleanOperator) -> bool {
        self.default_operator == operator
            && self.peek_kind().is_some_and(TokenKind::starts_operand)
    }

    /// Consume an explicit operator and check that an operand follows it.
    fn expect_operand_after(&mut self, keyword: &str) -> Result<()> {
        let position = self.advance().map_or(self.end, |l| l.position);
        if self.peek_kind().is_some_and(TokenKind::starts_operand) {
            Ok(())
        } else {
            Err(Error::syntax(position, format!("{} must be followed by a term", keyword)))
        }
    }

    fn or_expr(&mut self) -> Result<Option<Query>> {
        let mut children: Vec<Query> = self.and_expr()?.into_iter().collect();
        loop {
            if self.peek_kind() == Some(&TokenKind::Or) {
                self.expect_operand_after("OR")?;
            } else if !self.implicit(BooleanOperator::Or) {
                break;
            }
            children.extend(self.and_expr()?);
        }
        Ok((!children.is_empty()).then(|| Query::or(children)))
    }

    fn and_expr(&mut self) -> Result<Option<Query>> {
        let mut children: Vec<Query> = self.unary()?.into_iter().collect();
        loop {
            if self.peek_kind() == Some(&TokenKind::And) {
                self.expect_operand_after("AND")?;
            } else if !self.implicit(BooleanOperator::And) {
                break;
            }
            children.extend(self.unary()?);
        }
        Ok((!children.is_empty()).then(|| Query::and(children)))
    }

    fn unary(&mut self) -> Result<Option<Query>> {
        let Some(Lexeme { kind, position }) = self.advance() else {
            return Err(Error::syntax(self.end, "unexpected end of query"));
        };
        match kind {
            TokenKind::LParen => {
                if let Some(close) = self.peek().filter(|l| l.kind == TokenKind::RParen) {
                    return Err(Error::syntax(close.position, "empty group"));
                }
                if self.depth >= MAX_NESTING {
                    return Err(Error::syntax(position, "query nested too deeply"));
                }
                self.depth += 1;
                let inner = self.or_expr()?;
                self.depth -= 1;
                match self.advance() {
                    Some(Lexeme { kind: TokenKind::RParen, .. }) => Ok(inner),
                    Some(other) => Err(Error::syntax(other.position, "expected ')'")),
                    None => Err(Error::syntax(position, "unclosed '('")),
                }
            }
            TokenKind::RParen => Err(Error::syntax(position, "unmatched ')'")),
            TokenKind::And | TokenKind::Or => {
                Err(Error::syntax(position, "operator without a left-hand term"))
            }
            TokenKind::Field(field) => match self.advance() {
                Some(Lexeme { kind: TokenKind::Word(value), .. }) => self.field_clause(&field, &value),
                _ => Err(Error::syntax(position, format!("missing value for field '{}'", field))),
            },
            TokenKind::Word(value) => self.bare_clause(&value),
        }
    }

    fn field_clause(&self, field: &str, value: &str) -> Result<Option<Query>> {
        match self.schema.analyzer_for(field)? {
            Some(analyzer) => {
                let terms: Vec<Query> = analyzer
                    .terms(value)
                    .into_iter()
                    .map(|term| Query::term(field, term))
                    .collect();
                Ok((!terms.is_empty()).then(|| Query::and(terms)))
            }
            // Stored-only: known field, nothing to match
            None => Ok(Some(Query::match_none())),
        }
    }

    fn bare_clause(&self, value: &str) -> Result<Option<Query>> {
        let mut per_field = Vec::with_capacity(self.default_fields.len());
        for field in &self.default_fields {
            per_field.extend(self.field_clause(field, value)?);
        }
        Ok((!per_field.is_empty()).then(|| Query::or(per_field)))
    }
}
