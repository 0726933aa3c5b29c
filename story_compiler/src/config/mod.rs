//! Project configuration - story metadata, code/style files and tag rules.
//!
//! The host reads the project file from disk; this module only parses the
//! text (JSON or TOML), checks it, and offers in-memory edits.

mod file_list;

pub use file_list::*;

use serde::{Deserialize, Serialize};

use crate::injector::{Channel, ContentLoader};
use crate::tag_rules::{CompiledRule, TagRuleError};

/// Version used when the project does not declare one.
pub const DEFAULT_VERSION: &str = "1.0.0";

/// Errors raised while parsing, checking or editing a project configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("malformed project config (json): {0}")]
    Json(#[from] serde_json::Error),

    #[error("malformed project config (toml): {0}")]
    Toml(#[from] toml::de::Error),

    #[error("story title missing from project config")]
    MissingTitle,

    #[error("story author name missing from project config")]
    MissingAuthorName,

    /// A required file listed in the config does not exist.
    #[error("{kind} file \"{path}\" not found")]
    MissingFile { kind: &'static str, path: String },

    #[error("tag rule \"{rule}\" is malformed: {source}")]
    InvalidTagRule { rule: String, source: TagRuleError },

    #[error("{channel} tag rule \"{rule}\" already exists")]
    DuplicateTagRule { channel: Channel, rule: String },

    #[error("{channel} tag rule \"{rule}\" does not exist")]
    UnknownTagRule { channel: Channel, rule: String },
}

/// Story author.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Author {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Source repository of the story project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
}

/// Story metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryInfo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: Author,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repository: Option<Repository>,
}

/// A boolean tag expression and the files it pulls in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRule {
    pub rule: String,
    pub files: FileList,
}

impl TagRule {
    pub fn new(rule: impl Into<String>, files: impl Into<FileList>) -> Self {
        Self {
            rule: rule.into(),
            files: files.into(),
        }
    }

    /// Parse the rule once so it can be evaluated for every snippet.
    pub fn compile(&self) -> Result<CompiledTagRule, TagRuleError> {
        Ok(CompiledTagRule {
            rule: CompiledRule::compile(&self.rule)?,
            files: self.files.paths().to_vec(),
        })
    }
}

/// A tag rule whose expression has already been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledTagRule {
    pub rule: CompiledRule,
    pub files: Vec<String>,
}

/// Third-party libraries copied into the document head.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Libraries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scripts: Option<FileList>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<FileList>,
}

/// User code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// Runs exactly once, on the first rendered snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<FileList>,
    /// Prepended to every snippet.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global: Option<FileList>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRule>,
}

/// User styles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StylesConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story: Option<FileList>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<TagRule>,
}

/// The whole project configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub story: StoryInfo,
    #[serde(default)]
    pub libraries: Libraries,
    #[serde(default)]
    pub scripts: ScriptsConfig,
    #[serde(default)]
    pub styles: StylesConfig,
}

impl ProjectConfig {
    /// Create a minimal configuration.
    pub fn new(title: impl Into<String>, author: Author) -> Self {
        Self {
            story: StoryInfo {
                title: title.into(),
                author,
                ..StoryInfo::default()
            },
            ..Self::default()
        }
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_json_string_pretty(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The declared version, or [`DEFAULT_VERSION`].
    pub fn version(&self) -> &str {
        self.story.version.as_deref().unwrap_or(DEFAULT_VERSION)
    }

    /// Check metadata and the presence of every required file.
    ///
    /// Library files and tag-rule files are optional and not checked here.
    pub fn check<L: ContentLoader + ?Sized>(&self, loader: &L) -> Result<(), ConfigError> {
        if self.story.title.trim().is_empty() {
            return Err(ConfigError::MissingTitle);
        }
        if self.story.author.name.trim().is_empty() {
            return Err(ConfigError::MissingAuthorName);
        }
        if self.story.version.is_none() {
            tracing::warn!(
                default = DEFAULT_VERSION,
                "story version missing from project config, using default"
            );
        }

        let required = [
            ("story code", &self.scripts.story),
            ("global code", &self.scripts.global),
            ("story style", &self.styles.story),
        ];
        for (kind, list) in required {
            for path in list.iter().flat_map(FileList::paths) {
                if !loader.exists(path) {
                    return Err(ConfigError::MissingFile {
                        kind,
                        path: path.clone(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Tag rules of one channel, in declaration order.
    pub fn tag_rules(&self, channel: Channel) -> &[TagRule] {
        match channel {
            Channel::Script => &self.scripts.tags,
            Channel::Style => &self.styles.tags,
        }
    }

    fn tag_rules_mut(&mut self, channel: Channel) -> &mut Vec<TagRule> {
        match channel {
            Channel::Script => &mut self.scripts.tags,
            Channel::Style => &mut self.styles.tags,
        }
    }

    /// Compile every rule of a channel, failing on the first malformed one.
    pub fn compiled_tag_rules(&self, channel: Channel) -> Result<Vec<CompiledTagRule>, ConfigError> {
        self.tag_rules(channel)
            .iter()
            .map(|rule| {
                rule.compile().map_err(|source| ConfigError::InvalidTagRule {
                    rule: rule.rule.clone(),
                    source,
                })
            })
            .collect()
    }

    /// Append a tag rule. The rule text must compile and must not already
    /// exist in the channel.
    pub fn add_tag_rule(&mut self, channel: Channel, rule: TagRule) -> Result<(), ConfigError> {
        rule.compile().map_err(|source| ConfigError::InvalidTagRule {
            rule: rule.rule.clone(),
            source,
        })?;

        let rules = self.tag_rules_mut(channel);
        if rules.iter().any(|r| r.rule == rule.rule) {
            return Err(ConfigError::DuplicateTagRule {
                channel,
                rule: rule.rule,
            });
        }
        rules.push(rule);
        Ok(())
    }

    /// Remove a tag rule by its text, returning it.
    pub fn remove_tag_rule(&mut self, channel: Channel, rule: &str) -> Result<TagRule, ConfigError> {
        let rules = self.tag_rules_mut(channel);
        match rules.iter().position(|r| r.rule == rule) {
            Some(index) => Ok(rules.remove(index)),
            None => Err(ConfigError::UnknownTagRule {
                channel,
                rule: rule.to_string(),
            }),
        }
    }
}
