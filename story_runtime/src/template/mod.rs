//! Template rendering - turns a snippet's templated source into markup.
//!
//! Rendering is a capability injected into the story. A renderer sees four
//! bindings: `story`, `snippet`, `s` (the shared state) and `f` (the user
//! function table). It may mutate the last two.

pub mod ejs;
mod rhai_renderer;

pub use rhai_renderer::*;

use serde::Serialize;
use serde_json::Value;
use story_compiler::Author;

use crate::model::{Snippet, SnippetId};

/// Errors raised while rendering a template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The embedded-logic markup itself is malformed.
    #[error("template syntax error at byte {offset}: {message}")]
    Syntax { offset: usize, message: String },

    #[error("template code does not compile: {0}")]
    Compile(String),

    #[error("template code failed: {0}")]
    Runtime(String),

    /// A binding could not be passed to or read back from the template.
    #[error("template binding error: {0}")]
    Binding(String),
}

/// Read-only story data exposed as the `story` binding.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StoryView<'a> {
    pub title: &'a str,
    pub author: &'a Author,
    pub version: &'a str,
    pub history: &'a [SnippetId],
}

/// Everything a single render can see.
pub struct RenderContext<'a, F> {
    pub story: StoryView<'a>,
    pub snippet: &'a Snippet,
    /// Written back only when rendering succeeds.
    pub state: &'a mut Value,
    pub funcs: &'a mut F,
}

/// The template-rendering capability.
pub trait TemplateRenderer {
    /// The user function registry kept between renders (the `f` binding).
    type Funcs: Default;

    fn render(&self, template: &str, ctx: RenderContext<'_, Self::Funcs>) -> Result<String, RenderError>;

    /// Wrap one-time setup code as a leading execute block.
    fn setup_block(&self, code: &str) -> String {
        format!("<%\n{}\n%>\n", code)
    }
}

/// Escape text for inclusion in markup.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
