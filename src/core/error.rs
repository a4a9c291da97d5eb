use thiserror::Error;
use crate::core::types::DocId;

/// Coarse classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    QuerySyntax,
    DuplicateDocument,
    UnknownField,
    SourceRead,
    NotFound,
    StoreIo,
    InvalidState,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("query syntax error at {position}: {reason}")]
    QuerySyntax { position: usize, reason: String },

    #[error("document {doc_id} already indexed in field '{field}'")]
    DuplicateDocument { doc_id: DocId, field: String },

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("cannot read '{source_id}': {reason}")]
    SourceRead { source_id: String, reason: String },

    #[error("document {0} not found")]
    DocumentNotFound(DocId),

    #[error("store I/O error: {0}")]
    StoreIo(#[from] std::io::Error),

    #[error("corrupt index data: {0}")]
    Corrupt(String),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl Error {
    pub fn syntax(position: usize, reason: impl Into<String>) -> Self {
        Error::QuerySyntax {
            position,
            reason: reason.into(),
        }
    }

    pub fn source_read(source_id: impl Into<String>, reason: impl ToString) -> Self {
        Error::SourceRead {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::QuerySyntax { .. } => ErrorKind::QuerySyntax,
            Error::DuplicateDocument { .. } => ErrorKind::DuplicateDocument,
            Error::UnknownField(_) => ErrorKind::UnknownField,
            Error::SourceRead { .. } => ErrorKind::SourceRead,
            Error::DocumentNotFound(_) => ErrorKind::NotFound,
            Error::StoreIo(_) | Error::Corrupt(_) => ErrorKind::StoreIo,
            Error::InvalidState(_) => ErrorKind::InvalidState,
        }
    }

    /// A caller may retry with new input after these; everything else is surfaced as-is.
    pub fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::QuerySyntax | ErrorKind::SourceRead)
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Corrupt(err.to_string())
    }
}

impl From<fst::Error> for Error {
    fn from(err: fst::Error) -> Self {
        Error::Corrupt(format!("FST error: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(Error::syntax(3, "dangling operator").kind(), ErrorKind::QuerySyntax);
        assert_eq!(Error::Corrupt("bad crc".into()).kind(), ErrorKind::StoreIo);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(Error::from(io).kind(), ErrorKind::StoreIo);
    }

    #[test]
    fn test_only_query_and_source_errors_are_recoverable() {
        assert!(Error::syntax(0, "x").is_recoverable());
        assert!(Error::source_read("a.txt", "denied").is_recoverable());
        assert!(!Error::UnknownField("titolo".into()).is_recoverable());
        assert!(!Error::DuplicateDocument { doc_id: DocId(1), field: "nome".into() }.is_recoverable());
    }

    #[test]
    fn test_display_carries_position_and_identity() {
        let err = Error::syntax(7, "unclosed '('");
        assert_eq!(err.to_string(), "query syntax error at 7: unclosed '('");
        let err = Error::source_read("docs/a.txt", "permission denied");
        assert!(err.to_string().contains("docs/a.txt"));
    }
}
