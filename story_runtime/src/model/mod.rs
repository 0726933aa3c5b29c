//! Story model - the loaded story, its snippets and the session data.

mod checkpoint;
mod snippet;

pub use checkpoint::*;
pub use snippet::*;

use serde_json::Value;
use std::borrow::Cow;

use story_compiler::{Author, CompiledStory};

use crate::error::{Result, StoryError};
use crate::template::{RenderContext, StoryView, TemplateRenderer};

/// The aggregate root of a play session.
pub struct Story<R: TemplateRenderer> {
    title: String,
    author: Author,
    version: String,
    snippets: Vec<Snippet>,
    pub(crate) history: Vec<SnippetId>,
    pub(crate) state: Value,
    pub(crate) funcs: R::Funcs,
    pub(crate) checkpoint: Option<Checkpoint>,
    /// Pending one-time setup code, cleared by the first render.
    story_code: Option<String>,
    renderer: R,
}

impl<R: TemplateRenderer> Story<R> {
    /// Load a compiled story. Snippet ids follow document order.
    pub fn from_compiled(compiled: CompiledStory, renderer: R) -> Self {
        let snippets = compiled
            .snippets
            .into_iter()
            .enumerate()
            .map(|(index, snippet)| Snippet {
                id: SnippetId(index),
                name: snippet.name,
                start: snippet.start,
                tags: snippet.tags,
                source: snippet.source,
            })
            .collect();

        Self {
            title: compiled.title,
            author: compiled.author,
            version: compiled.version,
            snippets,
            history: Vec::new(),
            state: Value::Object(Default::default()),
            funcs: R::Funcs::default(),
            checkpoint: None,
            story_code: compiled.story_code.filter(|code| !code.trim().is_empty()),
            renderer,
        }
    }

    /// Load a compiled story document from its JSON form.
    pub fn from_json(text: &str, renderer: R) -> Result<Self> {
        let compiled = CompiledStory::from_json_str(text)?;
        Ok(Self::from_compiled(compiled, renderer))
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn snippets(&self) -> &[Snippet] {
        &self.snippets
    }

    pub fn history(&self) -> &[SnippetId] {
        &self.history
    }

    pub fn state(&self) -> &Value {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut Value {
        &mut self.state
    }

    pub fn funcs(&self) -> &R::Funcs {
        &self.funcs
    }

    pub fn funcs_mut(&mut self) -> &mut R::Funcs {
        &mut self.funcs
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoint.as_ref()
    }

    /// Whether the one-time story code has yet to run.
    pub fn story_code_pending(&self) -> bool {
        self.story_code.is_some()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Look a snippet up by id (position) or by name (first match).
    pub fn get_snippet(&self, target: impl Into<SnippetRef>) -> Option<&Snippet> {
        self.index_of(&target.into()).map(|index| &self.snippets[index])
    }

    /// The first snippet flagged as start.
    pub fn starting_snippet(&self) -> Option<&Snippet> {
        self.snippets.iter().find(|s| s.start)
    }

    fn index_of(&self, target: &SnippetRef) -> Option<usize> {
        match target {
            SnippetRef::Id(id) => (id.0 < self.snippets.len()).then_some(id.0),
            SnippetRef::Name(name) => self.snippets.iter().position(|s| &s.name == name),
        }
    }

    /// Render a snippet's source with the current state and functions.
    ///
    /// Pending story code is prepended to the first render and cleared, even
    /// if that render fails. A missing snippet leaves it pending.
    pub fn render_snippet(&mut self, target: impl Into<SnippetRef>) -> Result<String> {
        let target = target.into();
        let Some(index) = self.index_of(&target) else {
            tracing::error!(snippet = %target, "snippet not found in the story");
            return Err(StoryError::SnippetNotFound(target));
        };
        let snippet = &self.snippets[index];

        let template = match self.story_code.take() {
            Some(code) => {
                tracing::debug!(snippet = %snippet.name, "running story code");
                let mut template = self.renderer.setup_block(&code);
                template.push_str(&snippet.source);
                Cow::Owned(template)
            }
            None => Cow::Borrowed(snippet.source.as_str()),
        };

        let ctx = RenderContext {
            story: StoryView {
                title: &self.title,
                author: &self.author,
                version: &self.version,
                history: &self.history,
            },
            snippet,
            state: &mut self.state,
            funcs: &mut self.funcs,
        };

        self.renderer.render(&template, ctx).map_err(|source| {
            tracing::error!(snippet = %snippet.name, error = %source, "failed to render snippet");
            StoryError::Render {
                snippet: snippet.name.clone(),
                source,
            }
        })
    }
}
