use std::fmt;
use serde::{Serialize, Deserialize};
use crate::index::inverted::Term;

/// Query tree. Leaves are field-scoped terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Query {
    Term(Term),          // Single analyzed term in one field
    And(Vec<Query>),     // All children must match, scores summed
    Or(Vec<Query>),      // Any child may match, scores summed
}

impl Query {
    pub fn term(field: impl Into<String>, text: impl Into<String>) -> Self {
        Query::Term(Term::new(field, text))
    }

    /// Conjunction, collapsing a single child and splicing nested non-empty `And`s.
    pub fn and(children: Vec<Query>) -> Self {
        Self::combine(children, true)
    }

    /// Disjunction, collapsing a single child and splicing nested `Or`s.
    pub fn or(children: Vec<Query>) -> Self {
        Self::combine(children, false)
    }

    /// A query no document satisfies.
    pub fn match_none() -> Self {
        Query::Or(Vec::new())
    }

    pub fn is_match_none(&self) -> bool {
        matches!(self, Query::Or(children) | Query::And(children) if children.is_empty())
    }

    /// Leaf terms, left to right
    pub fn terms(&self) -> Vec<&Term> {
        let mut out = Vec::new();
        self.collect_terms(&mut out);
        out
    }

    fn collect_terms<'a>(&'a self, out: &mut Vec<&'a Term>) {
        match self {
            Query::Term(term) => out.push(term),
            Query::And(children) | Query::Or(children) => {
                for child in children {
                    child.collect_terms(out);
                }
            }
        }
    }

    fn combine(children: Vec<Query>, conjunction: bool) -> Self {
        let mut flat = Vec::with_capacity(children.len());
        for child in children {
            match child {
                Query::And(inner) if conjunction && !inner.is_empty() => flat.extend(inner),
                Query::Or(inner) if !conjunction => flat.extend(inner),
                other => flat.push(other),
            }
        }
        if flat.len() == 1 {
            return flat.remove(0);
        }
        if conjunction {
            Query::And(flat)
        } else {
            Query::Or(flat)
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (children, op) = match self {
            Query::Term(term) => return write!(f, "{}", term),
            Query::And(children) => (children, " AND "),
            Query::Or(children) => (children, " OR "),
        };
        write!(f, "(")?;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", op)?;
            }
            write!(f, "{}", child)?;
        }
        write!(f, ")")
    }
}
