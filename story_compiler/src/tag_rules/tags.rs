//! Snippet tag sets.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::TagRuleError;

// Snippet tags may start with an underscore; rule identifiers may not.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("tag pattern is valid"));

/// The validated set of tags attached to a snippet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct TagSet {
    tags: BTreeSet<String>,
}

impl TagSet {
    /// Create an empty tag set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace-delimited tag list, rejecting any malformed tag.
    pub fn parse(tag_list: &str) -> Result<Self, TagRuleError> {
        tag_list.split_whitespace().map(str::to_string).collect::<Vec<_>>().try_into()
    }

    /// Check a single tag against the snippet tag pattern.
    pub fn is_valid_tag(tag: &str) -> bool {
        TAG_RE.is_match(tag)
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }
}

impl TryFrom<Vec<String>> for TagSet {
    type Error = TagRuleError;

    fn try_from(tags: Vec<String>) -> Result<Self, Self::Error> {
        if let Some(bad) = tags.iter().find(|t| !Self::is_valid_tag(t)) {
            return Err(TagRuleError::Tag { tag: bad.clone() });
        }
        Ok(Self {
            tags: tags.into_iter().collect(),
        })
    }
}

impl From<TagSet> for Vec<String> {
    fn from(set: TagSet) -> Self {
        set.tags.into_iter().collect()
    }
}
