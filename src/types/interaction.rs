use serde::{Deserialize, Serialize};

use super::{CommentThread, Prompt, ViewCharge};

/// Kind of row in the interaction ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionKind {
    Like,
    Bookmark,
    View,
    Share,
}

impl InteractionKind {
    /// Toggles keep at most one row per user and prompt; events are append-only
    pub fn is_toggle(self) -> bool {
        matches!(self, InteractionKind::Like | InteractionKind::Bookmark)
    }

    pub fn stat_field(self) -> super::StatField {
        match self {
            InteractionKind::Like => super::StatField::Likes,
            InteractionKind::Bookmark => super::StatField::Bookmarks,
            InteractionKind::View => super::StatField::Views,
            InteractionKind::Share => super::StatField::Shares,
        }
    }
}

/// Result of flipping a like or bookmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleOutcome {
    /// State after the toggle
    pub active: bool,
    /// Counter after the toggle
    pub count: u64,
}

/// Everything shown on a prompt's detail page
#[derive(Debug, Clone, Serialize)]
pub struct PromptDetail {
    pub prompt: Prompt,
    pub charge: ViewCharge,
    pub liked: bool,
    pub bookmarked: bool,
    pub thread: CommentThread,
}
