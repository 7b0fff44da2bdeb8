//! Prompt cards: validation, authoring and lifecycle.

use tracing::info;

use super::ServiceContext;
use crate::config::{CatalogConfig, ContentConfig};
use crate::storage::PromptStore;
use crate::types::{
    HubError, NewPrompt, PointReason, Prompt, PromptStats, PromptStatus, PromptUpdate, Result,
    ValidationError, ValidationErrorKind, User, char_len, new_id,
};

pub struct PromptService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> PromptService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Publish a new prompt and pay the author the creation reward
    pub fn create(&self, author: &User, input: NewPrompt) -> Result<Prompt> {
        let content_cfg = &self.ctx.config.content;
        let catalog = &self.ctx.config.catalog;

        let title = validate_text("title", &input.title, content_cfg.max_title_length)?;
        let content = validate_text("content", &input.content, content_cfg.max_content_length)?;
        let description = validate_description(input.description.as_deref(), content_cfg)?;
        let category = resolve_category(input.category.as_deref(), catalog)?;
        let ai_model = resolve_ai_model(input.ai_model.as_deref(), catalog)?;
        let tags = match input.tags.as_deref() {
            Some(raw) => normalize_tags(raw, content_cfg.max_tags, content_cfg.max_tag_length)?,
            None => Vec::new(),
        };

        let now = self.ctx.now();
        let prompt = Prompt {
            id: new_id(),
            author_id: author.id.clone(),
            author_name: author.username.clone(),
            title,
            content,
            description,
            category,
            ai_model,
            tags,
            stats: PromptStats::default(),
            created_at: now,
            updated_at: now,
            status: PromptStatus::Published,
        };

        self.ctx.db.transaction(|conn| {
            PromptStore::new(conn).insert(&prompt)?;
            self.ctx.points().grant_in(
                conn,
                &author.id,
                PointReason::PromptCreated,
                &prompt.id,
                self.ctx.config.points.prompt_created,
            )?;
            Ok(())
        })?;

        info!(prompt_id = %prompt.id, author_id = %author.id, "Prompt published");
        Ok(prompt)
    }

    pub fn get(&self, id: &str) -> Result<Prompt> {
        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn)
            .get(id)?
            .ok_or_else(|| HubError::not_found("prompt", id))
    }

    /// Apply a partial update; only the author may edit
    pub fn update(&self, user: &User, id: &str, changes: PromptUpdate) -> Result<Prompt> {
        let mut prompt = self.owned(user, id, "edit")?;
        if changes.is_empty() {
            return Ok(prompt);
        }

        let content_cfg = &self.ctx.config.content;
        let catalog = &self.ctx.config.catalog;

        if let Some(title) = changes.title.as_deref() {
            prompt.title = validate_text("title", title, content_cfg.max_title_length)?;
        }
        if let Some(content) = changes.content.as_deref() {
            prompt.content = validate_text("content", content, content_cfg.max_content_length)?;
        }
        if let Some(description) = changes.description.as_deref() {
            prompt.description = validate_description(Some(description), content_cfg)?;
        }
        if let Some(category) = changes.category.as_deref() {
            prompt.category = resolve_category(Some(category), catalog)?;
        }
        if let Some(ai_model) = changes.ai_model.as_deref() {
            prompt.ai_model = resolve_ai_model(Some(ai_model), catalog)?;
        }
        if let Some(tags) = changes.tags.as_deref() {
            prompt.tags = normalize_tags(tags, content_cfg.max_tags, content_cfg.max_tag_length)?;
        }
        prompt.updated_at = self.ctx.now();

        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn).update(&prompt)?;
        info!(prompt_id = %prompt.id, "Prompt updated");
        Ok(prompt)
    }

    /// Hide from the feed without deleting
    pub fn archive(&self, user: &User, id: &str) -> Result<Prompt> {
        self.set_status(user, id, PromptStatus::Archived)
    }

    /// Put an archived prompt back in the feed
    pub fn restore(&self, user: &User, id: &str) -> Result<Prompt> {
        self.set_status(user, id, PromptStatus::Published)
    }

    /// Remove the prompt with its comments and interactions
    pub fn delete(&self, user: &User, id: &str) -> Result<()> {
        let prompt = self.owned(user, id, "delete")?;
        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn).delete(&prompt.id)?;
        info!(prompt_id = %prompt.id, "Prompt deleted");
        Ok(())
    }

    /// A user's prompts, newest first
    pub fn by_author(&self, user_id: &str) -> Result<Vec<Prompt>> {
        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn).by_author(user_id)
    }

    fn set_status(&self, user: &User, id: &str, status: PromptStatus) -> Result<Prompt> {
        let mut prompt = self.owned(user, id, "change")?;
        if prompt.status == status {
            return Ok(prompt);
        }
        prompt.status = status;
        prompt.updated_at = self.ctx.now();

        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn).update(&prompt)?;
        info!(prompt_id = %prompt.id, ?status, "Prompt status changed");
        Ok(prompt)
    }

    fn owned(&self, user: &User, id: &str, action: &str) -> Result<Prompt> {
        let prompt = self.get(id)?;
        if !prompt.is_authored_by(&user.id) {
            return Err(HubError::forbidden(format!(
                "only the author can {} this prompt",
                action
            )));
        }
        Ok(prompt)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Trimmed, non-empty text of at most `max` characters
pub fn validate_text(field: &str, value: &str, max: usize) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::missing(field).into());
    }
    let len = char_len(value);
    if len > max {
        return Err(ValidationError::too_long(field, max, len).into());
    }
    Ok(value.to_string())
}

fn validate_description(value: Option<&str>, content: &ContentConfig) -> Result<String> {
    let value = value.map(str::trim).unwrap_or_default();
    let len = char_len(value);
    if len > content.max_description_length {
        return Err(
            ValidationError::too_long("description", content.max_description_length, len).into(),
        );
    }
    Ok(value.to_string())
}

fn resolve_category(value: Option<&str>, catalog: &CatalogConfig) -> Result<String> {
    let key = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(catalog.default_category.as_str());
    if catalog.category(key).is_none() {
        return Err(unknown_value("category", key, catalog.categories.iter().map(|c| c.key.as_str())));
    }
    Ok(key.to_string())
}

fn resolve_ai_model(value: Option<&str>, catalog: &CatalogConfig) -> Result<String> {
    let key = value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(catalog.default_ai_model.as_str());
    if catalog.ai_model(key).is_none() {
        return Err(unknown_value("ai_model", key, catalog.ai_models.iter().map(|m| m.key.as_str())));
    }
    Ok(key.to_string())
}

fn unknown_value<'k>(field: &str, value: &str, known: impl Iterator<Item = &'k str>) -> HubError {
    ValidationError::new(ValidationErrorKind::UnknownValue, "is not a known value")
        .with_field(field)
        .with_comparison(
            format!("one of {}", known.collect::<Vec<_>>().join(", ")),
            value,
        )
        .into()
}

/// Parse a comma-separated tag list.
///
/// Tags are trimmed, empties dropped and duplicates (ignoring case) removed,
/// keeping the first spelling.
pub fn normalize_tags(raw: &str, max_tags: usize, max_len: usize) -> Result<Vec<String>> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let len = char_len(tag);
        if len > max_len {
            return Err(ValidationError::too_long("tags", max_len, len).into());
        }
        if !tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
            tags.push(tag.to_string());
        }
    }
    if tags.len() > max_tags {
        return Err(ValidationError::new(ValidationErrorKind::Range, "too many tags")
            .with_field("tags")
            .with_comparison(format!("at most {}", max_tags), tags.len().to_string())
            .into());
    }
    Ok(tags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{context, post, register, reload};
    use proptest::prelude::*;

    fn new_prompt(title: &str) -> NewPrompt {
        NewPrompt {
            title: title.to_string(),
            content: "Summarize the following text".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_applies_defaults_and_reward() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");

        let prompt = ctx
            .prompts()
            .create(
                &alice,
                NewPrompt {
                    tags: Some(" ai, Writing ,,ai ".to_string()),
                    ..new_prompt("  Summarizer  ")
                },
            )
            .unwrap();

        assert_eq!(prompt.title, "Summarizer");
        assert_eq!(prompt.category, "text");
        assert_eq!(prompt.ai_model, "gpt4");
        assert_eq!(prompt.tags, vec!["ai", "Writing"]);
        assert_eq!(reload(&ctx, &alice).points, 150);
        assert_eq!(ctx.prompts().get(&prompt.id).unwrap().author_name, "alice");
    }

    #[test]
    fn test_create_validation() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let prompts = ctx.prompts();

        assert!(matches!(
            prompts.create(&alice, new_prompt("   ")),
            Err(HubError::Validation(_))
        ));
        assert!(prompts.create(&alice, new_prompt(&"x".repeat(100))).is_ok());
        assert!(prompts.create(&alice, new_prompt(&"x".repeat(101))).is_err());

        let err = prompts
            .create(
                &alice,
                NewPrompt {
                    category: Some("poetry".to_string()),
                    ..new_prompt("Poem")
                },
            )
            .unwrap_err();
        match err {
            HubError::Validation(v) => assert_eq!(v.kind, ValidationErrorKind::UnknownValue),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_only_author_can_modify() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let bob = register(&ctx, "bob");
        let prompt = post(&ctx, &alice, "Original");
        let prompts = ctx.prompts();

        let change = PromptUpdate {
            title: Some("Hijacked".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            prompts.update(&bob, &prompt.id, change.clone()),
            Err(HubError::Forbidden(_))
        ));
        assert!(matches!(prompts.archive(&bob, &prompt.id), Err(HubError::Forbidden(_))));
        assert!(matches!(prompts.delete(&bob, &prompt.id), Err(HubError::Forbidden(_))));

        let updated = prompts.update(&alice, &prompt.id, change).unwrap();
        assert_eq!(updated.title, "Hijacked");
        assert_eq!(prompts.get(&prompt.id).unwrap().title, "Hijacked");
    }

    #[test]
    fn test_archive_restore_and_delete() {
        let (ctx, _) = context();
        let alice = register(&ctx, "alice");
        let prompt = post(&ctx, &alice, "Lifecycle");
        let prompts = ctx.prompts();

        assert_eq!(prompts.archive(&alice, &prompt.id).unwrap().status, PromptStatus::Archived);
        assert_eq!(prompts.restore(&alice, &prompt.id).unwrap().status, PromptStatus::Published);
        assert_eq!(prompts.by_author(&alice.id).unwrap().len(), 1);

        prompts.delete(&alice, &prompt.id).unwrap();
        assert!(matches!(prompts.get(&prompt.id), Err(HubError::NotFound { .. })));
        assert!(prompts.by_author(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn test_normalize_tags_limits() {
        assert_eq!(normalize_tags("", 10, 20).unwrap(), Vec::<String>::new());
        assert!(normalize_tags("a,b,c", 2, 20).is_err());
        assert!(normalize_tags("a,A,a", 1, 20).is_ok());
        assert!(normalize_tags(&"t".repeat(21), 10, 20).is_err());
    }

    proptest! {
        #[test]
        fn prop_normalized_tags_are_trimmed_and_unique(
            parts in prop::collection::vec("[ a-zA-Z]{0,8}", 0..12)
        ) {
            let raw = parts.join(",");
            if let Ok(tags) = normalize_tags(&raw, 50, 20) {
                for tag in &tags {
                    prop_assert!(!tag.is_empty());
                    prop_assert_eq!(tag.trim(), tag.as_str());
                }
                let mut lowered: Vec<String> = tags.iter().map(|t| t.to_lowercase()).collect();
                lowered.sort();
                lowered.dedup();
                prop_assert_eq!(lowered.len(), tags.len());
            }
        }
    }
}
