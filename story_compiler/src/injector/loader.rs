//! Content loaders - where script and style payloads come from.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Failure to load a content file.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("content file \"{path}\" not found")]
    NotFound { path: String },

    #[error("failed to read content file \"{path}\": {source}")]
    Io { path: String, source: io::Error },
}

impl ContentError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ContentError::NotFound { .. })
    }
}

/// Resolves a content reference to its text.
pub trait ContentLoader {
    fn load(&self, path: &str) -> Result<String, ContentError>;

    fn exists(&self, path: &str) -> bool {
        self.load(path).is_ok()
    }
}

impl<L: ContentLoader + ?Sized> ContentLoader for &L {
    fn load(&self, path: &str) -> Result<String, ContentError> {
        (**self).load(path)
    }

    fn exists(&self, path: &str) -> bool {
        (**self).exists(path)
    }
}

/// Reads files relative to a project root. Absolute references are used
/// as they are.
#[derive(Debug, Clone)]
pub struct FsContentLoader {
    root: PathBuf,
}

impl FsContentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path.trim());
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

impl ContentLoader for FsContentLoader {
    fn load(&self, path: &str) -> Result<String, ContentError> {
        std::fs::read_to_string(self.resolve(path)).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ContentError::NotFound {
                    path: path.to_string(),
                }
            } else {
                ContentError::Io {
                    path: path.to_string(),
                    source,
                }
            }
        })
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).is_file()
    }
}

/// In-memory content, keyed by reference.
#[derive(Debug, Clone, Default)]
pub struct MemoryContentLoader {
    files: HashMap<String, String>,
}

impl MemoryContentLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with_file(mut self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, content: impl Into<String>) {
        self.files.insert(path.into(), content.into());
    }
}

impl ContentLoader for MemoryContentLoader {
    fn load(&self, path: &str) -> Result<String, ContentError> {
        self.files
            .get(path.trim())
            .cloned()
            .ok_or_else(|| ContentError::NotFound {
                path: path.to_string(),
            })
    }

    fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path.trim())
    }
}
