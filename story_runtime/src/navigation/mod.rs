//! Navigation - the state machine driving a play session.
//!
//! States go `Unstarted -> Showing(id) -> Showing(other) -> ...`, with no
//! terminal state. Every transition renders into the single current view;
//! a failed transition leaves that view, the state and the history as they
//! were.
//!
//! Links in the rendered view are returned as [`LinkBinding`]s. The host
//! wires each one to [`StoryPlayer::follow_link`].

mod links;

pub use links::*;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Result, StoryError};
use crate::model::{Checkpoint, SaveObj, SnippetId, SnippetRef, Story};
use crate::template::TemplateRenderer;

/// Where the session is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PlayerState {
    Unstarted,
    Showing(SnippetId),
}

/// The rendered current view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub snippet: SnippetId,
    pub markup: String,
    pub links: Vec<LinkBinding>,
}

/// Options for [`StoryPlayer::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Show this snippet instead of the last one in the loaded history.
    pub landing_snippet: Option<SnippetRef>,
    pub add_to_history: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            landing_snippet: None,
            add_to_history: true,
        }
    }
}

/// Options for [`StoryPlayer::restore_checkpoint`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestoreOptions {
    /// Also bring back the checkpoint's history.
    pub restore_history: bool,
    /// Show the last snippet of the (possibly restored) history.
    pub jump_to_checkpoint: bool,
    /// Only used when jumping.
    pub add_to_history: bool,
}

impl Default for RestoreOptions {
    fn default() -> Self {
        Self {
            restore_history: false,
            jump_to_checkpoint: true,
            add_to_history: true,
        }
    }
}

/// Owns a story and its current view.
pub struct StoryPlayer<R: TemplateRenderer> {
    story: Story<R>,
    status: PlayerState,
    view: Option<RenderedView>,
}

impl<R: TemplateRenderer> StoryPlayer<R> {
    pub fn new(story: Story<R>) -> Self {
        Self {
            story,
            status: PlayerState::Unstarted,
            view: None,
        }
    }

    pub fn story(&self) -> &Story<R> {
        &self.story
    }

    pub fn status(&self) -> PlayerState {
        self.status
    }

    pub fn current_view(&self) -> Option<&RenderedView> {
        self.view.as_ref()
    }

    pub fn state(&self) -> &Value {
        self.story.state()
    }

    /// Host-side access to the state, e.g. for initial setup.
    pub fn state_mut(&mut self) -> &mut Value {
        self.story.state_mut()
    }

    pub fn history(&self) -> &[SnippetId] {
        self.story.history()
    }

    /// Show the starting snippet.
    pub fn start(&mut self) -> Result<SnippetId> {
        let Some(id) = self.story.starting_snippet().map(|s| s.id) else {
            tracing::error!(title = %self.story.title(), "no starting snippet found in the story");
            return Err(StoryError::NoStartingSnippet);
        };
        self.show_snippet(id, true)
    }

    /// Render a snippet into the current view, optionally recording it in
    /// history. On failure nothing changes.
    pub fn show_snippet(&mut self, target: impl Into<SnippetRef>, add_to_history: bool) -> Result<SnippetId> {
        let target = target.into();
        let markup = self.story.render_snippet(target.clone())?;
        let id = self
            .story
            .get_snippet(target.clone())
            .map(|s| s.id)
            .ok_or(StoryError::SnippetNotFound(target))?;

        if add_to_history {
            self.story.history.push(id);
        }
        tracing::debug!(snippet = %id, add_to_history, "showing snippet");

        self.view = Some(RenderedView {
            snippet: id,
            links: extract_links(&markup),
            markup,
        });
        self.status = PlayerState::Showing(id);
        Ok(id)
    }

    /// Activate a link of the current view.
    pub fn follow_link(&mut self, link: &LinkBinding) -> Result<SnippetId> {
        self.show_snippet(link.target.as_str(), true)
    }

    /// Snapshot state, history and checkpoint for the host to persist.
    pub fn save(&self) -> SaveObj {
        SaveObj {
            state: self.story.state.clone(),
            history: self.story.history.clone(),
            checkpoint: self.story.checkpoint.clone(),
        }
    }

    /// Replace state and history with a saved session and show where it
    /// left off.
    pub fn load(&mut self, save: SaveObj, options: LoadOptions) -> Result<SnippetId> {
        self.load_with(save, options, |_| {})
    }

    /// Like [`load`](Self::load), calling `on_loaded` with the new state
    /// before the landing snippet is rendered.
    pub fn load_with<F>(&mut self, save: SaveObj, options: LoadOptions, on_loaded: F) -> Result<SnippetId>
    where
        F: FnOnce(&mut Value),
    {
        let SaveObj {
            state,
            history,
            checkpoint,
        } = save;

        self.story.state = state;
        self.story.history = history;
        if checkpoint.is_some() {
            self.story.checkpoint = checkpoint;
        }
        tracing::info!(history = self.story.history.len(), "session loaded");

        on_loaded(&mut self.story.state);

        let target = match options.landing_snippet {
            Some(target) => target,
            None => match self.story.history.last() {
                Some(id) => SnippetRef::Id(*id),
                None => {
                    tracing::error!("loaded history is empty and no landing snippet given");
                    return Err(StoryError::EmptyHistory);
                }
            },
        };
        self.show_snippet(target, options.add_to_history)
    }

    /// Deep-copy state and history into the checkpoint slot, replacing any
    /// previous checkpoint.
    pub fn create_checkpoint(&mut self) -> &Checkpoint {
        tracing::info!(history = self.story.history.len(), "checkpoint created");
        self.story.checkpoint.insert(Checkpoint {
            state: self.story.state.clone(),
            history: self.story.history.clone(),
        })
    }

    pub fn checkpoint(&self) -> Option<&Checkpoint> {
        self.story.checkpoint()
    }

    /// Restore the checkpoint. Returns `false`, changing nothing, when
    /// there is no checkpoint.
    ///
    /// The state always comes back. The history only with
    /// `restore_history`. When jumping, the target is the last entry of the
    /// history as it stands after that step, so with `restore_history` off
    /// the player stays where it is.
    ///
    /// A failed jump is logged and leaves the current view in place; the
    /// restore itself still counts, so the call returns `true`.
    pub fn restore_checkpoint(&mut self, options: RestoreOptions) -> bool {
        let Some(checkpoint) = &self.story.checkpoint else {
            return false;
        };

        self.story.state = checkpoint.state.clone();
        if options.restore_history {
            self.story.history = checkpoint.history.clone();
        }
        tracing::info!(restore_history = options.restore_history, "checkpoint restored");

        if options.jump_to_checkpoint {
            match self.story.history.last().copied() {
                Some(id) => {
                    if let Err(err) = self.show_snippet(id, options.add_to_history) {
                        tracing::warn!(snippet = %id, error = %err, "jump after checkpoint restore failed");
                    }
                }
                None => tracing::error!("history is empty, nowhere to jump after restore"),
            }
        }

        true
    }
}
