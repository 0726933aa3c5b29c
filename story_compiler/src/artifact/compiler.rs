//! Compile pipeline: project config + crawled snippets -> [`CompiledStory`].

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CompiledSnippet, CompiledStory, SnippetSource, StoryAssets};
use crate::config::{CompiledTagRule, ConfigError, FileList, ProjectConfig};
use crate::injector::{
    assemble_source, inject_optional_content, snippet_content, BlockOrigin, Channel, ContentBlock,
    ContentError, ContentLoader,
};
use crate::tag_rules::{TagRuleError, TagSet};

/// `<iff-link>` authoring elements, self-closing or with content.
static IFF_LINK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)<iff-link\b[^>]*/>|<iff-link\b[^>]*>.*?</iff-link\s*>")
        .expect("iff-link pattern is valid")
});

/// Fatal build errors. Any of them aborts the whole compilation.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("no snippets found in the project")]
    NoSnippets,

    #[error("found {count} unnamed snippet(s)")]
    UnnamedSnippets { count: usize },

    #[error("snippet name \"{name}\" is used more than once")]
    DuplicateSnippetName { name: String },

    #[error("snippet \"{name}\" (requested as testing starting point) not found")]
    TestSnippetNotFound { name: String },

    /// Zero or several snippets carry the start flag.
    #[error("expected exactly one starting snippet, found {count} {names:?}")]
    StartingSnippets { count: usize, names: Vec<String> },

    #[error("error while processing snippet \"{snippet}\": {source}")]
    SnippetTags {
        snippet: String,
        source: TagRuleError,
    },

    #[error("error while processing snippet \"{snippet}\": {source}")]
    SnippetContent {
        snippet: String,
        source: ContentError,
    },

    #[error(transparent)]
    Content(#[from] ContentError),
}

/// Compile-time switches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Make this snippet the only starting snippet.
    pub test_from: Option<String>,
}

/// Tag rules of both channels, compiled once per build.
struct ChannelRules {
    scripts: Vec<CompiledTagRule>,
    styles: Vec<CompiledTagRule>,
}

/// Turns crawled snippets into a compiled story.
pub struct StoryCompiler<'a, L: ContentLoader + ?Sized> {
    config: &'a ProjectConfig,
    loader: &'a L,
    options: CompileOptions,
}

impl<'a, L: ContentLoader + ?Sized> StoryCompiler<'a, L> {
    pub fn new(config: &'a ProjectConfig, loader: &'a L) -> Self {
        Self {
            config,
            loader,
            options: CompileOptions::default(),
        }
    }

    pub fn with_options(mut self, options: CompileOptions) -> Self {
        self.options = options;
        self
    }

    /// Run the whole pipeline. Nothing is produced unless every step
    /// succeeds.
    pub fn compile(&self, sources: Vec<SnippetSource>) -> Result<CompiledStory, BuildError> {
        self.config.check(self.loader)?;
        let sources = self.sanity_check(sources)?;
        let global = self.global_blocks()?;

        // every tag list is checked before any rule is compiled
        let tagged = sources
            .into_iter()
            .map(|source| match TagSet::parse(&source.tags) {
                Ok(tags) => Ok((source, tags)),
                Err(err) => Err(BuildError::SnippetTags {
                    snippet: source.name,
                    source: err,
                }),
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let rules = ChannelRules {
            scripts: self.config.compiled_tag_rules(Channel::Script)?,
            styles: self.config.compiled_tag_rules(Channel::Style)?,
        };

        let snippets = tagged
            .into_iter()
            .map(|(source, tags)| self.compile_snippet(source, &tags, &rules, &global))
            .collect::<Result<Vec<_>, BuildError>>()?;

        let compiled = CompiledStory {
            title: self.config.story.title.clone(),
            author: self.config.story.author.clone(),
            version: self.config.version().to_string(),
            snippets,
            story_code: self.concat_required(self.config.scripts.story.as_ref())?,
            assets: self.assets()?,
        };

        tracing::info!(
            title = %compiled.title,
            snippets = compiled.snippets.len(),
            "story compiled"
        );
        Ok(compiled)
    }

    fn compile_snippet(
        &self,
        source: SnippetSource,
        tags: &TagSet,
        rules: &ChannelRules,
        global: &[ContentBlock],
    ) -> Result<CompiledSnippet, BuildError> {
        let tag_scripts = inject_optional_content(tags, &rules.scripts, Channel::Script, self.loader)?;
        let tag_styles = inject_optional_content(tags, &rules.styles, Channel::Style, self.loader)?;

        let snippet_error = |err: ContentError| BuildError::SnippetContent {
            snippet: source.name.clone(),
            source: err,
        };
        let own_scripts = snippet_content(&source.name, &source.scripts, Channel::Script, self.loader)
            .map_err(snippet_error)?;
        let own_styles = snippet_content(&source.name, &source.styles, Channel::Style, self.loader)
            .map_err(snippet_error)?;

        let blocks = global
            .iter()
            .chain(&tag_styles)
            .chain(&tag_scripts)
            .chain(&own_styles)
            .chain(&own_scripts);

        Ok(CompiledSnippet {
            source: assemble_source(blocks, &strip_authoring_links(&source.body)),
            tags: source.tags.split_whitespace().map(str::to_string).collect(),
            start: source.start,
            name: source.name,
        })
    }

    /// Basic checks over the crawled snippets as crawled, then the
    /// test-start override.
    fn sanity_check(&self, mut sources: Vec<SnippetSource>) -> Result<Vec<SnippetSource>, BuildError> {
        if sources.is_empty() {
            return Err(BuildError::NoSnippets);
        }

        let unnamed = sources.iter().filter(|s| s.name.trim().is_empty()).count();
        if unnamed > 0 {
            return Err(BuildError::UnnamedSnippets { count: unnamed });
        }

        let mut seen = HashSet::new();
        for source in &sources {
            if !seen.insert(source.name.as_str()) {
                return Err(BuildError::DuplicateSnippetName {
                    name: source.name.clone(),
                });
            }
        }

        let starting: Vec<String> = sources
            .iter()
            .filter(|s| s.start)
            .map(|s| s.name.clone())
            .collect();
        if starting.len() != 1 {
            return Err(BuildError::StartingSnippets {
                count: starting.len(),
                names: starting,
            });
        }

        if let Some(target) = &self.options.test_from {
            if !sources.iter().any(|s| &s.name == target) {
                return Err(BuildError::TestSnippetNotFound {
                    name: target.clone(),
                });
            }
            tracing::info!(snippet = %target, "overriding starting snippet as requested");
            for source in &mut sources {
                source.start = &source.name == target;
            }
        }

        Ok(sources)
    }

    fn global_blocks(&self) -> Result<Vec<ContentBlock>, BuildError> {
        let Some(list) = &self.config.scripts.global else {
            return Ok(Vec::new());
        };
        list.paths()
            .iter()
            .map(|path| -> Result<ContentBlock, BuildError> {
                Ok(ContentBlock {
                    channel: Channel::Script,
                    origin: BlockOrigin::Global,
                    path: path.clone(),
                    content: self.loader.load(path)?,
                })
            })
            .collect()
    }

    /// Concatenate required files, one newline after each.
    fn concat_required(&self, list: Option<&FileList>) -> Result<Option<String>, BuildError> {
        let Some(list) = list.filter(|l| !l.is_empty()) else {
            return Ok(None);
        };
        let mut out = String::new();
        for path in list.paths() {
            out.push_str(&self.loader.load(path)?);
            out.push('\n');
        }
        Ok(Some(out))
    }

    /// Load optional library files, skipping missing ones with a warning.
    fn load_libraries(&self, list: Option<&FileList>, kind: &str) -> Result<Vec<String>, BuildError> {
        let mut out = Vec::new();
        for path in list.map(FileList::paths).unwrap_or_default() {
            match self.loader.load(path) {
                Ok(content) => out.push(content),
                Err(err) if err.is_not_found() => {
                    tracing::warn!(path = %path, kind, "library not found, skipping");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(out)
    }

    fn assets(&self) -> Result<StoryAssets, BuildError> {
        Ok(StoryAssets {
            library_scripts: self.load_libraries(self.config.libraries.scripts.as_ref(), "script")?,
            library_styles: self.load_libraries(self.config.libraries.styles.as_ref(), "style")?,
            story_style: self.concat_required(self.config.styles.story.as_ref())?,
        })
    }
}

/// Drop `<iff-link>` elements; they only describe the story graph to
/// authoring tools.
fn strip_authoring_links(body: &str) -> std::borrow::Cow<'_, str> {
    IFF_LINK_RE.replace_all(body, "")
}
