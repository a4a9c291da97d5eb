use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use parking_lot::RwLock;
use crate::core::error::Result;
use crate::storage::file_lock::FileLock;

/// Byte-addressable persistent store of named blobs
///
/// `write` replaces a blob as a whole: readers see either the old bytes or
/// the new ones, never a mix.
pub trait Storage: Send + Sync {
    /// `Ok(None)` when no blob of that name exists
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>>;

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()>;

    fn delete(&self, name: &str) -> Result<()>;

    fn list(&self) -> Result<Vec<String>>;

    /// Cross-process single-writer guard, for backends that need one.
    fn writer_lock(&self) -> Result<Option<FileLock>> {
        Ok(None)
    }
}

/// Storage kept in process memory. Clones share the same blobs, which lets
/// tests reopen an index over "persisted" state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    blobs: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.blobs.read().get(name).cloned())
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        self.blobs.write().insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        self.blobs.write().remove(name);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = self.blobs.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

/// Directory-backed storage: one file per blob, replaced via temp file + rename.
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn open(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)?;
        Ok(FileStorage { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.base_dir.join(name)
    }
}

impl Storage for FileStorage {
    fn read(&self, name: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.blob_path(name)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == IoErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let tmp = self.blob_path(&format!("{}.tmp", name));
        {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, self.blob_path(name))?;
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<()> {
        match fs::remove_file(self.blob_path(name)) {
            Err(e) if e.kind() != IoErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }

    fn list(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if !name.starts_with('.') && !name.ends_with(".tmp") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    fn writer_lock(&self) -> Result<Option<FileLock>> {
        FileLock::acquire(&self.base_dir).map(Some)
    }
}
