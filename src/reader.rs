//! File reading collaborator
//!
//! The sequencer never touches the filesystem directly. It asks a [`FileReader`]
//! for the bytes behind a [`FileRef`] and awaits the answer, so the same merge
//! logic runs against files on disk or bytes already held in memory.

use std::collections::HashMap;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Opaque handle to a user-selected file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef {
    path: PathBuf,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Display name: the final path component, or the whole path if there is none
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

impl From<&str> for FileRef {
    fn from(path: &str) -> Self {
        FileRef::new(path)
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        FileRef::new(path)
    }
}

/// Awaitable source of file bytes
///
/// Failures are reported as [`Error::Read`] naming the file.
pub trait FileReader {
    fn read(&self, file: &FileRef) -> impl Future<Output = Result<Vec<u8>>>;
}

/// Reads files from the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsReader;

impl FileReader for FsReader {
    async fn read(&self, file: &FileRef) -> Result<Vec<u8>> {
        tokio::fs::read(file.path())
            .await
            .map_err(|source| Error::Read {
                name: file.name(),
                source,
            })
    }
}

/// Serves bytes that were handed over in memory (uploads, tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryReader {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register bytes under a path and return the handle for it
    pub fn insert(&mut self, path: impl Into<PathBuf>, bytes: Vec<u8>) -> FileRef {
        let path = path.into();
        self.files.insert(path.clone(), bytes);
        FileRef::new(path)
    }
}

impl FileReader for MemoryReader {
    async fn read(&self, file: &FileRef) -> Result<Vec<u8>> {
        self.files
            .get(file.path())
            .cloned()
            .ok_or_else(|| Error::Read {
                name: file.name(),
                source: io::Error::new(io::ErrorKind::NotFound, "file not found"),
            })
    }
}
