//! Snippet injector - attaches script and style payloads to a snippet body.
//!
//! Payloads come from three places:
//! - **global code**: prepended to every snippet
//! - **tag rules**: optional, included when the rule matches the snippet's tags
//! - **snippet files**: required, listed on the snippet itself
//!
//! Scripts and styles are two independent channels. The final source is
//! `[global][tag styles][tag scripts][snippet styles][snippet scripts][body]`,
//! each channel keeping its own declaration order.

mod loader;

pub use loader::*;

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::CompiledTagRule;
use crate::tag_rules::TagSet;

/// Content channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Executed as template code.
    Script,
    /// Emitted inside a `<style>` element.
    Style,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Script => f.write_str("script"),
            Channel::Style => f.write_str("style"),
        }
    }
}

/// Where a content block came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockOrigin {
    Global,
    TagRule(String),
    Snippet(String),
}

/// One loaded payload, ready to be wrapped into the snippet source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub channel: Channel,
    pub origin: BlockOrigin,
    pub path: String,
    pub content: String,
}

impl ContentBlock {
    /// Short provenance note placed at the top of the wrapped block.
    pub fn provenance(&self) -> String {
        let what = match (&self.origin, self.channel) {
            (BlockOrigin::Global, _) => "global code".to_string(),
            (BlockOrigin::TagRule(rule), _) => format!("tag rule \"{}\"", rule),
            (BlockOrigin::Snippet(name), Channel::Script) => format!("code for snippet \"{}\"", name),
            (BlockOrigin::Snippet(name), Channel::Style) => format!("style for snippet \"{}\"", name),
        };
        format!("{} (file: \"{}\")", what, self.path)
    }

    /// Wrap the payload: an execute block for scripts, a `<style>` element
    /// for styles.
    pub fn wrap(&self) -> String {
        match self.channel {
            Channel::Script => format!(
                "<%\n/* {} */\n{}\n%>\n\n",
                self.provenance(),
                self.content
            ),
            Channel::Style => format!(
                "<style>\n/* {} */\n{}\n</style>\n\n",
                self.provenance(),
                self.content
            ),
        }
    }
}

/// Collect the optional content of every matching rule of one channel.
///
/// Rules keep their declaration order, and so do the files of each rule.
/// A file that does not exist is skipped with a warning.
pub fn inject_optional_content<L: ContentLoader + ?Sized>(
    tags: &TagSet,
    rules: &[CompiledTagRule],
    channel: Channel,
    loader: &L,
) -> Result<Vec<ContentBlock>, ContentError> {
    let mut blocks = Vec::new();

    for rule in rules {
        if !rule.rule.matches(tags) {
            continue;
        }
        tracing::debug!(rule = rule.rule.source(), %channel, "tag rule matched");

        for path in &rule.files {
            match loader.load(path) {
                Ok(content) => blocks.push(ContentBlock {
                    channel,
                    origin: BlockOrigin::TagRule(rule.rule.source().to_string()),
                    path: path.clone(),
                    content,
                }),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(
                        rule = rule.rule.source(),
                        path = %path,
                        "file for tag rule not found, skipping"
                    );
                }
                Err(err) => return Err(err),
            }
        }
    }

    Ok(blocks)
}

/// Load the files a snippet lists for itself. Every one of them is required.
pub fn snippet_content<L: ContentLoader + ?Sized>(
    snippet_name: &str,
    paths: &[String],
    channel: Channel,
    loader: &L,
) -> Result<Vec<ContentBlock>, ContentError> {
    paths
        .iter()
        .map(|path| -> Result<ContentBlock, ContentError> {
            Ok(ContentBlock {
                channel,
                origin: BlockOrigin::Snippet(snippet_name.to_string()),
                path: path.clone(),
                content: loader.load(path)?,
            })
        })
        .collect()
}

/// Concatenate wrapped blocks in order, followed by the body.
pub fn assemble_source<'a>(blocks: impl IntoIterator<Item = &'a ContentBlock>, body: &str) -> String {
    let mut source: String = blocks.into_iter().map(ContentBlock::wrap).collect();
    source.push_str(body);
    source
}
