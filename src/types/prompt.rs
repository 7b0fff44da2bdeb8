use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Shared AI prompt card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prompt {
    pub id: String,
    pub author_id: String,
    pub author_name: String,
    pub title: String,
    pub content: String,
    pub description: String,
    /// Catalog category key
    pub category: String,
    /// Catalog AI model key
    pub ai_model: String,
    pub tags: Vec<String>,
    pub stats: PromptStats,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: PromptStatus,
}

impl Prompt {
    pub fn is_published(&self) -> bool {
        self.status == PromptStatus::Published
    }

    pub fn is_authored_by(&self, user_id: &str) -> bool {
        self.author_id == user_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptStatus {
    #[default]
    Published,
    Archived,
}

/// Denormalized counters kept in sync with the interaction and comment ledgers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptStats {
    pub likes: u64,
    pub bookmarks: u64,
    pub shares: u64,
    pub comments: u64,
    pub views: u64,
}

/// Counter column on the prompts table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatField {
    Likes,
    Bookmarks,
    Shares,
    Comments,
    Views,
}

impl StatField {
    pub fn column(self) -> &'static str {
        match self {
            StatField::Likes => "likes",
            StatField::Bookmarks => "bookmarks",
            StatField::Shares => "shares",
            StatField::Comments => "comments",
            StatField::Views => "views",
        }
    }
}

/// Input for a new prompt card
#[derive(Debug, Clone, Default)]
pub struct NewPrompt {
    pub title: String,
    pub content: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub ai_model: Option<String>,
    /// Comma-separated tag list as typed by the user
    pub tags: Option<String>,
}

/// Partial update of an existing prompt; `None` leaves a field untouched
#[derive(Debug, Clone, Default)]
pub struct PromptUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub ai_model: Option<String>,
    pub tags: Option<String>,
}

impl PromptUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.ai_model.is_none()
            && self.tags.is_none()
    }
}
