use std::fs;
use std::path::{Path, PathBuf};
use crate::core::error::{Error, Result};
use crate::core::types::Document;

/// Field names used by [`FileSource`], matching `Schema::file_documents`.
pub const CONTENT_FIELD: &str = "contenuto";
pub const NAME_FIELD: &str = "nome";
pub const PATH_FIELD: &str = "path";

/// Something that can produce one document's raw field text.
///
/// `read` failing with `SourceRead` makes a batch skip this document and
/// report it by `identity`.
pub trait DocumentSource {
    fn identity(&self) -> String;

    fn read(&self) -> Result<Document>;
}

impl<S: DocumentSource + ?Sized> DocumentSource for Box<S> {
    fn identity(&self) -> String {
        (**self).identity()
    }

    fn read(&self) -> Result<Document> {
        (**self).read()
    }
}

/// Source over fields already in memory
#[derive(Debug, Clone)]
pub struct TextSource {
    identity: String,
    document: Document,
}

impl TextSource {
    pub fn new(identity: impl Into<String>, document: Document) -> Self {
        TextSource {
            identity: identity.into(),
            document,
        }
    }
}

impl DocumentSource for TextSource {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn read(&self) -> Result<Document> {
        Ok(self.document.clone())
    }
}

/// One file on disk: its text, its file name and its path.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DocumentSource for FileSource {
    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn read(&self) -> Result<Document> {
        let identity = self.identity();
        let bytes = fs::read(&self.path).map_err(|e| Error::source_read(&identity, e))?;
        let text = String::from_utf8(bytes)
            .map_err(|e| Error::source_read(&identity, format!("not valid UTF-8: {}", e.utf8_error())))?;
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Document::new()
            .with_field(CONTENT_FIELD, text)
            .with_field(NAME_FIELD, name)
            .with_field(PATH_FIELD, identity))
    }
}
