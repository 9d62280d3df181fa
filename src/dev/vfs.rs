//! In-memory virtual filesystem for development builds.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use serde_json::Value;

/// Keyed by output-relative path. Reads of absent files yield `None`, never
/// an error: client and server bundles finish compiling at different times
/// and a missing file only means "not built yet".
pub struct MemoryFs {
    files: DashMap<PathBuf, Arc<Vec<u8>>>,
}

impl MemoryFs {
    pub fn new() -> Self {
        Self {
            files: DashMap::new(),
        }
    }

    /// Write a file, replacing any previous contents.
    pub fn write(&self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), Arc::new(contents.into()));
    }

    /// Read raw bytes.
    pub fn read(&self, path: &Path) -> Option<Arc<Vec<u8>>> {
        self.files.get(path).map(|entry| entry.value().clone())
    }

    /// Read as UTF-8 text. Invalid UTF-8 counts as absent.
    pub fn read_to_string(&self, path: &Path) -> Option<String> {
        let bytes = self.read(path)?;
        String::from_utf8(bytes.as_ref().clone()).ok()
    }

    /// Read and parse as JSON. Absent or unparseable files count as not
    /// built yet.
    pub fn read_json(&self, path: &Path) -> Option<Value> {
        let text = self.read_to_string(path)?;
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Unparseable JSON in build output");
                None
            }
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}
