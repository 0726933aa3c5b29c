//! Checkpoints and save snapshots.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::SnippetId;

/// Deep snapshot of state and history, used for "undo to here".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub state: Value,
    pub history: Vec<SnippetId>,
}

/// The persisted form of a session.
///
/// Only `state`, `history` and the checkpoint survive a save/load cycle.
/// The encoding is left to the host; JSON helpers are provided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveObj {
    pub state: Value,
    pub history: Vec<SnippetId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
}

impl SaveObj {
    pub fn to_json_string(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    /// The snippet a load lands on when no landing snippet is given.
    pub fn last_visited(&self) -> Option<SnippetId> {
        self.history.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_save_survives_json() {
        let save = SaveObj {
            state: json!({ "lamp": "lit", "coins": 3 }),
            history: vec![SnippetId(0), SnippetId(2)],
            checkpoint: Some(Checkpoint {
                state: json!({ "coins": 1 }),
                history: vec![SnippetId(0)],
            }),
        };
        let text = save.to_json_string().unwrap();
        assert!(text.contains("\"history\":[0,2]"));
        assert_eq!(SaveObj::from_json_str(&text).unwrap(), save);
        assert_eq!(save.last_visited(), Some(SnippetId(2)));
    }

    #[test]
    fn test_checkpoint_is_optional() {
        let save = SaveObj::from_json_str(r#"{"state":{},"history":[]}"#).unwrap();
        assert!(save.checkpoint.is_none());
        assert_eq!(save.last_visited(), None);
    }
}
