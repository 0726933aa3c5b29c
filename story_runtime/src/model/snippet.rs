//! Snippets - the navigable pages of a story.

use serde::{Deserialize, Serialize};
use std::fmt;

use story_compiler::{evaluate_rule, TagRuleError, TagSet};

/// Positional snippet id, assigned when the story is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnippetId(pub usize);

impl fmt::Display for SnippetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How a caller names a snippet: by id or by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SnippetRef {
    Id(SnippetId),
    Name(String),
}

impl fmt::Display for SnippetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnippetRef::Id(id) => write!(f, "with id {}", id),
            SnippetRef::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

impl From<SnippetId> for SnippetRef {
    fn from(id: SnippetId) -> Self {
        SnippetRef::Id(id)
    }
}

impl From<usize> for SnippetRef {
    fn from(id: usize) -> Self {
        SnippetRef::Id(SnippetId(id))
    }
}

impl From<&str> for SnippetRef {
    fn from(name: &str) -> Self {
        SnippetRef::Name(name.to_string())
    }
}

impl From<String> for SnippetRef {
    fn from(name: String) -> Self {
        SnippetRef::Name(name)
    }
}

impl From<&String> for SnippetRef {
    fn from(name: &String) -> Self {
        SnippetRef::Name(name.clone())
    }
}

/// A snippet as played. Never changes once the story is loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snippet {
    pub id: SnippetId,
    pub name: String,
    pub start: bool,
    pub tags: Vec<String>,
    /// Templated markup, with all injected code and styles.
    pub source: String,
}

impl Snippet {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Evaluate a tag rule against this snippet's tags.
    pub fn matches_rule(&self, rule: &str) -> Result<bool, TagRuleError> {
        let tags = TagSet::try_from(self.tags.clone())?;
        evaluate_rule(rule, &tags)
    }
}
