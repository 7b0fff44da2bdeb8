//! Configuration Types
//!
//! All configuration structures with sensible defaults.
//! Supports global (~/.config/promptub/) and project (.promptub/) level configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::constants;
use crate::types::{HubError, Result};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Configuration version
    pub version: String,

    /// Database location
    pub storage: StorageConfig,

    /// Reward amounts and daily cap
    pub points: PointsConfig,

    /// Detail view quota and cost
    pub viewing: ViewingConfig,

    /// Content limits and paging
    pub content: ContentConfig,

    /// Account and session rules
    pub security: SecurityConfig,

    /// Categories and AI models prompts can be filed under
    pub catalog: CatalogConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            storage: StorageConfig::default(),
            points: PointsConfig::default(),
            viewing: ViewingConfig::default(),
            content: ContentConfig::default(),
            security: SecurityConfig::default(),
            catalog: CatalogConfig::default(),
        }
    }
}

impl Config {
    /// Validate configuration values are within acceptable ranges.
    /// Returns `HubError::Config` on validation failure.
    pub fn validate(&self) -> Result<()> {
        let rewards = [
            ("points.welcome_bonus", self.points.welcome_bonus),
            ("points.prompt_created", self.points.prompt_created),
            ("points.like_received", self.points.like_received),
            ("points.comment_created", self.points.comment_created),
            ("points.prompt_shared", self.points.prompt_shared),
            ("points.daily_login", self.points.daily_login),
        ];
        if let Some((name, value)) = rewards.iter().find(|(_, v)| *v < 0) {
            return Err(config_error(format!(
                "{} must not be negative, got {}",
                name, value
            )));
        }

        if self.points.daily_limit <= 0 {
            return Err(config_error(format!(
                "points.daily_limit must be greater than 0, got {}",
                self.points.daily_limit
            )));
        }

        if self.viewing.cost_per_view <= 0 {
            return Err(config_error(format!(
                "viewing.cost_per_view must be greater than 0, got {}",
                self.viewing.cost_per_view
            )));
        }

        if !(-12..=14).contains(&self.viewing.utc_offset_hours) {
            return Err(config_error(format!(
                "viewing.utc_offset_hours must be between -12 and 14, got {}",
                self.viewing.utc_offset_hours
            )));
        }

        let limits = [
            ("content.max_title_length", self.content.max_title_length),
            ("content.max_content_length", self.content.max_content_length),
            ("content.max_comment_length", self.content.max_comment_length),
            ("content.max_tags", self.content.max_tags),
            ("content.max_tag_length", self.content.max_tag_length),
            ("content.default_page_size", self.content.default_page_size),
        ];
        if let Some((name, _)) = limits.iter().find(|(_, v)| *v == 0) {
            return Err(config_error(format!("{} must be greater than 0", name)));
        }

        if self.content.default_page_size > self.content.max_page_size {
            return Err(config_error(format!(
                "content.default_page_size ({}) exceeds content.max_page_size ({})",
                self.content.default_page_size, self.content.max_page_size
            )));
        }

        if self.security.session_timeout_secs == 0 {
            return Err(config_error(
                "security.session_timeout_secs must be greater than 0",
            ));
        }

        if self.security.min_username_length == 0
            || self.security.min_username_length > self.security.max_username_length
        {
            return Err(config_error(format!(
                "security username length range {}..={} is invalid",
                self.security.min_username_length, self.security.max_username_length
            )));
        }

        if self.security.min_password_length == 0 {
            return Err(config_error(
                "security.min_password_length must be greater than 0",
            ));
        }

        self.catalog.validate()
    }
}

fn config_error(message: impl Into<String>) -> HubError {
    HubError::Config(message.into())
}

// =============================================================================
// Storage Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file; defaults to `.promptub/promptub.db` in the project
    pub database_path: Option<PathBuf>,
}

// =============================================================================
// Points Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PointsConfig {
    pub welcome_bonus: i64,
    pub prompt_created: i64,
    pub like_received: i64,
    pub comment_created: i64,
    pub prompt_shared: i64,
    pub daily_login: i64,

    /// Cap on capped rewards earned per day
    pub daily_limit: i64,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            welcome_bonus: constants::points::WELCOME_BONUS,
            prompt_created: constants::points::PROMPT_CREATED,
            like_received: constants::points::LIKE_RECEIVED,
            comment_created: constants::points::COMMENT_CREATED,
            prompt_shared: constants::points::PROMPT_SHARED,
            daily_login: constants::points::DAILY_LOGIN,
            daily_limit: constants::points::DAILY_LIMIT,
        }
    }
}

// =============================================================================
// Viewing Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewingConfig {
    /// Base free detail views per day
    pub free_views_per_day: u32,

    /// Add the level bonus on top of the base quota
    pub level_bonus: bool,

    /// Points charged per view past the quota
    pub cost_per_view: i64,

    /// Opening one's own prompt is free and does not use quota
    pub own_prompts_free: bool,

    /// Hours east of UTC at which the day (quota and reward cap) resets
    pub utc_offset_hours: i32,
}

impl Default for ViewingConfig {
    fn default() -> Self {
        Self {
            free_views_per_day: constants::viewing::FREE_VIEWS_PER_DAY,
            level_bonus: true,
            cost_per_view: constants::viewing::COST_PER_VIEW,
            own_prompts_free: true,
            utc_offset_hours: constants::viewing::UTC_OFFSET_HOURS,
        }
    }
}

// =============================================================================
// Content Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    pub max_title_length: usize,
    pub max_content_length: usize,
    pub max_description_length: usize,
    pub max_comment_length: usize,
    pub max_tags: usize,
    pub max_tag_length: usize,
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            max_title_length: constants::content::MAX_TITLE_LENGTH,
            max_content_length: constants::content::MAX_CONTENT_LENGTH,
            max_description_length: constants::content::MAX_DESCRIPTION_LENGTH,
            max_comment_length: constants::content::MAX_COMMENT_LENGTH,
            max_tags: constants::content::MAX_TAGS,
            max_tag_length: constants::content::MAX_TAG_LENGTH,
            default_page_size: constants::content::DEFAULT_PAGE_SIZE,
            max_page_size: constants::content::MAX_PAGE_SIZE,
        }
    }
}

// =============================================================================
// Security Configuration
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub session_timeout_secs: u64,
    pub min_password_length: usize,
    pub min_username_length: usize,
    pub max_username_length: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            session_timeout_secs: constants::security::SESSION_TIMEOUT_SECS,
            min_password_length: constants::security::MIN_PASSWORD_LENGTH,
            min_username_length: constants::security::MIN_USERNAME_LENGTH,
            max_username_length: constants::security::MAX_USERNAME_LENGTH,
        }
    }
}

// =============================================================================
// Catalog Configuration
// =============================================================================

/// One selectable category or AI model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Stored key
    pub key: String,
    /// Display label
    pub label: String,
    #[serde(default)]
    pub emoji: Option<String>,
}

impl CatalogEntry {
    fn new(key: &str, label: &str, emoji: Option<&str>) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            emoji: emoji.map(str::to_string),
        }
    }

    /// Label with the emoji prefix when there is one
    pub fn display(&self) -> String {
        match &self.emoji {
            Some(emoji) => format!("{} {}", emoji, self.label),
            None => self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub categories: Vec<CatalogEntry>,
    pub default_category: String,
    pub ai_models: Vec<CatalogEntry>,
    pub default_ai_model: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            categories: vec![
                CatalogEntry::new("text", "Text", Some("📝")),
                CatalogEntry::new("image", "Image", Some("🎨")),
                CatalogEntry::new("writing", "Writing", Some("✍️")),
                CatalogEntry::new("development", "Development", Some("💻")),
                CatalogEntry::new("marketing", "Marketing", Some("📈")),
                CatalogEntry::new("education", "Education", Some("📚")),
                CatalogEntry::new("design", "Design", Some("🖌️")),
                CatalogEntry::new("business", "Business", Some("💼")),
            ],
            default_category: "text".to_string(),
            ai_models: vec![
                CatalogEntry::new("gpt4", "ChatGPT", None),
                CatalogEntry::new("claude", "Claude", None),
                CatalogEntry::new("gemini", "Gemini", None),
                CatalogEntry::new("midjourney", "MJ", None),
                CatalogEntry::new("dalle", "DALL-E", None),
                CatalogEntry::new("copilot", "Copilot", None),
                CatalogEntry::new("stable_diffusion", "SD", None),
            ],
            default_ai_model: "gpt4".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn category(&self, key: &str) -> Option<&CatalogEntry> {
        self.categories.iter().find(|c| c.key == key)
    }

    pub fn ai_model(&self, key: &str) -> Option<&CatalogEntry> {
        self.ai_models.iter().find(|m| m.key == key)
    }

    /// Display label of a category; unknown keys are shown as-is
    pub fn category_label(&self, key: &str) -> String {
        self.category(key)
            .map(CatalogEntry::display)
            .unwrap_or_else(|| key.to_string())
    }

    /// Display label of an AI model; unknown keys are shown as "Unknown"
    pub fn ai_model_label(&self, key: &str) -> String {
        self.ai_model(key)
            .map(|m| m.label.clone())
            .unwrap_or_else(|| "Unknown".to_string())
    }

    fn validate(&self) -> Result<()> {
        if self.categories.is_empty() || self.ai_models.is_empty() {
            return Err(config_error(
                "catalog must define at least one category and one AI model",
            ));
        }
        if self.category(&self.default_category).is_none() {
            return Err(config_error(format!(
                "catalog.default_category '{}' is not a configured category",
                self.default_category
            )));
        }
        if self.ai_model(&self.default_ai_model).is_none() {
            return Err(config_error(format!(
                "catalog.default_ai_model '{}' is not a configured AI model",
                self.default_ai_model
            )));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.version, "1.0");
        assert_eq!(config.points.welcome_bonus, 100);
        assert_eq!(config.viewing.free_views_per_day, 10);
        assert_eq!(config.content.default_page_size, 12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_catalog_labels() {
        let catalog = CatalogConfig::default();
        assert_eq!(catalog.category_label("text"), "📝 Text");
        assert_eq!(catalog.category_label("poetry"), "poetry");
        assert_eq!(catalog.ai_model_label("gpt4"), "ChatGPT");
        assert_eq!(catalog.ai_model_label("llama"), "Unknown");
    }

    #[test]
    fn test_validate_rejects_zero_cost() {
        let mut config = Config::default();
        config.viewing.cost_per_view = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cost_per_view"));
    }

    #[test]
    fn test_validate_rejects_unknown_default_category() {
        let mut config = Config::default();
        config.catalog.default_category = "poetry".to_string();
        assert!(matches!(config.validate(), Err(HubError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_page_size_above_max() {
        let mut config = Config::default();
        config.content.default_page_size = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_reward() {
        let mut config = Config::default();
        config.points.like_received = -1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("points.like_received"));
    }
}
