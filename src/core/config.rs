use std::fs;
use std::path::{Path, PathBuf};
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, Result};
use crate::query::parser::BooleanOperator;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// None keeps the whole index in memory.
    pub storage_path: Option<PathBuf>,

    pub default_limit: usize,                   // K when the caller passes none
    pub default_operator: BooleanOperator,      // Joins adjacent query clauses

    pub parallel_threshold: usize,              // Batch size that switches to rayon
    pub worker_threads: usize,

    pub compress: bool,                         // lz4 on persisted blobs
}

impl Default for Config {
    fn default() -> Self {
        Config {
            storage_path: None,
            default_limit: 10,
            default_operator: BooleanOperator::And,
            parallel_threshold: 64,
            worker_threads: num_cpus::get(),
            compress: true,
        }
    }
}

impl Config {
    pub fn in_memory() -> Self {
        Config::default()
    }

    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Config {
            storage_path: Some(path.into()),
            ..Config::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::InvalidState(format!("invalid config: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
