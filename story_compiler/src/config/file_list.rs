//! File lists - one path or many.

use serde::{Deserialize, Serialize};

/// Either a single path or an array of paths, as written in the project file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileList {
    One(String),
    Many(Vec<String>),
}

impl FileList {
    /// All paths, in declaration order.
    pub fn paths(&self) -> &[String] {
        match self {
            FileList::One(path) => std::slice::from_ref(path),
            FileList::Many(paths) => paths,
        }
    }

    pub fn len(&self) -> usize {
        self.paths().len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths().is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths().iter().any(|p| p == path)
    }
}

impl Default for FileList {
    fn default() -> Self {
        FileList::Many(Vec::new())
    }
}

impl From<Vec<String>> for FileList {
    /// A single path collapses to the scalar form.
    fn from(mut paths: Vec<String>) -> Self {
        if paths.len() == 1 {
            FileList::One(paths.remove(0))
        } else {
            FileList::Many(paths)
        }
    }
}

impl From<&str> for FileList {
    fn from(path: &str) -> Self {
        FileList::One(path.to_string())
    }
}
