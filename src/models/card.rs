//! Card model and the three-stage workflow.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable card identifier, assigned when a card is created.
pub type CardId = Uuid;

/// Workflow stage of a card. The declaration order is the progression.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Stage {
    #[default]
    ToDiscuss,
    Discussing,
    Done,
}

impl Stage {
    pub const ALL: [Stage; 3] = [Stage::ToDiscuss, Stage::Discussing, Stage::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::ToDiscuss => "toDiscuss",
            Stage::Discussing => "discussing",
            Stage::Done => "done",
        }
    }

    /// Column index of this stage (0, 1 or 2).
    pub fn index(self) -> usize {
        match self {
            Stage::ToDiscuss => 0,
            Stage::Discussing => 1,
            Stage::Done => 2,
        }
    }

    pub fn previous(self) -> Option<Stage> {
        match self {
            Stage::ToDiscuss => None,
            Stage::Discussing => Some(Stage::ToDiscuss),
            Stage::Done => Some(Stage::Discussing),
        }
    }

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::ToDiscuss => Some(Stage::Discussing),
            Stage::Discussing => Some(Stage::Done),
            Stage::Done => None,
        }
    }

    /// True when `other` is immediately before or after this stage.
    pub fn is_adjacent(self, other: Stage) -> bool {
        self.previous() == Some(other) || self.next() == Some(other)
    }
}

/// The three display labels a stage is persisted under.
///
/// Stored documents carry the label rather than a canonical name, so boards
/// written with one label set only read back correctly with the same set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageLabels {
    labels: [String; 3],
}

impl StageLabels {
    pub fn new(to_discuss: &str, discussing: &str, done: &str) -> Self {
        Self {
            labels: [
                to_discuss.to_string(),
                discussing.to_string(),
                done.to_string(),
            ],
        }
    }

    /// Parse a comma separated list of exactly three distinct, non-empty labels.
    pub fn parse(raw: &str) -> Option<Self> {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let [to_discuss, discussing, done] = parts.as_slice() else {
            return None;
        };
        if parts.iter().any(|p| p.is_empty()) {
            return None;
        }
        if to_discuss == discussing || discussing == done || to_discuss == done {
            return None;
        }
        Some(Self::new(to_discuss, discussing, done))
    }

    pub fn label(&self, stage: Stage) -> &str {
        &self.labels[stage.index()]
    }

    pub fn stage_for(&self, label: &str) -> Option<Stage> {
        Stage::ALL.into_iter().find(|s| self.label(*s) == label)
    }
}

impl Default for StageLabels {
    fn default() -> Self {
        Self::new("To discuss", "Discussing", "Done")
    }
}

/// One discussion item on a board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: CardId,
    pub text: String,
    pub votes: u32,
    pub status: Stage,
}

impl Card {
    /// A blank card waiting to be discussed.
    pub fn empty() -> Self {
        Self::merged(String::new(), 0)
    }

    /// A fresh card carrying combined content; always starts in `ToDiscuss`.
    pub fn merged(text: String, votes: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            votes,
            status: Stage::ToDiscuss,
        }
    }
}

/// Vote direction accepted by the vote operation, sent as `1` or `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "i32")]
pub enum VoteDelta {
    Up,
    Down,
}

impl VoteDelta {
    pub fn value(self) -> i64 {
        match self {
            VoteDelta::Up => 1,
            VoteDelta::Down => -1,
        }
    }
}

impl TryFrom<i32> for VoteDelta {
    type Error = String;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(VoteDelta::Up),
            -1 => Ok(VoteDelta::Down),
            other => Err(format!("vote delta must be 1 or -1, got {}", other)),
        }
    }
}
