//! The compiled story document and the pipeline that produces it.
//!
//! The document is a JSON value embedded in the final artifact by the
//! bundler; the runtime reads it back unchanged.

mod compiler;

pub use compiler::*;

use serde::{Deserialize, Serialize};

use crate::config::Author;

/// A snippet as handed over by the project crawler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnippetSource {
    pub name: String,
    pub start: bool,
    /// Whitespace-delimited tag list, as written on the snippet.
    pub tags: String,
    /// Snippet-specific script files, already resolved by the crawler.
    pub scripts: Vec<String>,
    /// Snippet-specific style files, already resolved by the crawler.
    pub styles: Vec<String>,
    /// Raw templated markup.
    pub body: String,
}

impl SnippetSource {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            ..Self::default()
        }
    }

    pub fn starting(mut self) -> Self {
        self.start = true;
        self
    }

    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    pub fn with_script(mut self, path: impl Into<String>) -> Self {
        self.scripts.push(path.into());
        self
    }

    pub fn with_style(mut self, path: impl Into<String>) -> Self {
        self.styles.push(path.into());
        self
    }
}

/// A snippet in its final, injected form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledSnippet {
    pub name: String,
    #[serde(default)]
    pub start: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    pub source: String,
}

/// Document-level assets placed in the head by the bundler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryAssets {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_scripts: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub library_styles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_style: Option<String>,
}

/// Everything the runtime needs to play a story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledStory {
    pub title: String,
    pub author: Author,
    pub version: String,
    pub snippets: Vec<CompiledSnippet>,
    /// Runs once, before the first snippet shown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_code: Option<String>,
    #[serde(default)]
    pub assets: StoryAssets,
}

impl CompiledStory {
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The first snippet flagged as start.
    pub fn starting_snippet(&self) -> Option<&CompiledSnippet> {
        self.snippets.iter().find(|s| s.start)
    }

    /// Output file name derived from the title, e.g. `The Long-Night` ->
    /// `The_Long_Night.html`, or `The_Long_Night_from_cellar.html` when
    /// testing from a given snippet.
    pub fn suggested_file_name(&self, test_from: Option<&str>) -> String {
        let mut stem = self.title.clone();
        if let Some(snippet) = test_from {
            stem.push_str("_from_");
            stem.push_str(snippet);
        }
        let mut name: String = stem
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c })
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        name.push_str(".html");
        name
    }
}
