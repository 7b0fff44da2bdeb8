use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder text left behind by a soft delete
pub const DELETED_COMMENT_TEXT: &str = "[deleted comment]";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub prompt_id: String,
    pub author_id: String,
    pub author_name: String,
    pub content: String,
    /// Root comment this is a reply to
    pub parent_id: Option<String>,
    pub likes: u64,
    pub status: CommentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.status == CommentStatus::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommentStatus {
    #[default]
    Active,
    Deleted,
}

/// Root comment with its replies
#[derive(Debug, Clone, Serialize)]
pub struct CommentNode {
    pub comment: Comment,
    pub replies: Vec<Comment>,
}

/// Two-level comment tree of a prompt
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentThread {
    pub roots: Vec<CommentNode>,
}

impl CommentThread {
    /// Number of active comments in the thread (roots and replies)
    pub fn active_count(&self) -> usize {
        self.roots
            .iter()
            .map(|node| {
                usize::from(node.comment.is_active())
                    + node.replies.iter().filter(|r| r.is_active()).count()
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}
