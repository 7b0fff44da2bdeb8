//! Browsing: filters, search, sorting, pagination and facets.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::ServiceContext;
use crate::constants::content::MIN_SUGGESTION_WORD;
use crate::storage::PromptStore;
use crate::types::{Prompt, Result, char_len};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum FeedSort {
    /// Newest first
    #[default]
    Recent,
    /// Most viewed first
    Popular,
    /// Most liked first
    Trending,
}

#[derive(Debug, Clone, Default)]
pub struct FeedQuery {
    pub category: Option<String>,
    pub ai_model: Option<String>,
    pub search: Option<String>,
    pub sort: FeedSort,
    /// 1-based; 0 is read as 1
    pub page: usize,
    pub per_page: Option<usize>,
}

/// One page of results plus navigation metadata
#[derive(Debug, Clone, Serialize)]
pub struct FeedPage<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: usize,
    pub per_page: usize,
    pub total_pages: usize,
    pub has_next: bool,
    pub has_prev: bool,
}

impl<T> FeedPage<T> {
    /// Cut page `page` (1-based) of `per_page` items; pages past the end are empty
    pub fn paginate(items: Vec<T>, page: usize, per_page: usize) -> Self {
        let page = page.max(1);
        let per_page = per_page.max(1);
        let total = items.len();
        let start = (page - 1).saturating_mul(per_page);
        let end = start.saturating_add(per_page);

        let items = items
            .into_iter()
            .skip(start)
            .take(per_page)
            .collect();

        Self {
            items,
            total,
            page,
            per_page,
            total_pages: total.div_ceil(per_page),
            has_next: end < total,
            has_prev: page > 1,
        }
    }
}

/// Category or AI model with the number of published prompts using it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetCount {
    pub key: String,
    pub label: String,
    pub count: usize,
}

pub struct FeedService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> FeedService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    pub fn feed(&self, query: &FeedQuery) -> Result<FeedPage<Prompt>> {
        let content = &self.ctx.config.content;
        let per_page = query
            .per_page
            .unwrap_or(content.default_page_size)
            .clamp(1, content.max_page_size);

        let needle = query
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let mut prompts: Vec<Prompt> = self
            .published()?
            .into_iter()
            .filter(|p| query.category.as_deref().is_none_or(|c| p.category == c))
            .filter(|p| query.ai_model.as_deref().is_none_or(|m| p.ai_model == m))
            .filter(|p| needle.as_deref().is_none_or(|n| matches_search(p, n)))
            .collect();

        // published() is newest first and the sort is stable, so ties stay newest first
        match query.sort {
            FeedSort::Recent => {}
            FeedSort::Popular => prompts.sort_by(|a, b| b.stats.views.cmp(&a.stats.views)),
            FeedSort::Trending => prompts.sort_by(|a, b| b.stats.likes.cmp(&a.stats.likes)),
        }

        let page = FeedPage::paginate(prompts, query.page, per_page);
        debug!(
            total = page.total,
            page = page.page,
            sort = ?query.sort,
            "Feed page built"
        );
        Ok(page)
    }

    pub fn categories(&self) -> Result<Vec<FacetCount>> {
        let catalog = &self.ctx.config.catalog;
        let prompts = self.published()?;
        Ok(facets(prompts.iter().map(|p| p.category.as_str()), |key| {
            catalog.category_label(key)
        }))
    }

    pub fn ai_models(&self) -> Result<Vec<FacetCount>> {
        let catalog = &self.ctx.config.catalog;
        let prompts = self.published()?;
        Ok(facets(prompts.iter().map(|p| p.ai_model.as_str()), |key| {
            catalog.ai_model_label(key)
        }))
    }

    /// Title words and tags containing `query`, case-insensitively
    pub fn suggestions(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        // keyed by lowercase form; first spelling seen wins
        let mut found: BTreeMap<String, String> = BTreeMap::new();
        for prompt in self.published()? {
            let words = prompt
                .title
                .split_whitespace()
                .filter(|w| char_len(w) >= MIN_SUGGESTION_WORD);
            for candidate in words.chain(prompt.tags.iter().map(String::as_str)) {
                let lowered = candidate.to_lowercase();
                if lowered.contains(&needle) {
                    found.entry(lowered).or_insert_with(|| candidate.to_string());
                }
            }
        }

        Ok(found.into_values().take(limit).collect())
    }

    fn published(&self) -> Result<Vec<Prompt>> {
        let conn = self.ctx.db.connection()?;
        PromptStore::new(&conn).published()
    }
}

fn matches_search(prompt: &Prompt, needle: &str) -> bool {
    [
        prompt.title.as_str(),
        prompt.content.as_str(),
        prompt.description.as_str(),
        prompt.category.as_str(),
    ]
    .into_iter()
    .chain(prompt.tags.iter().map(String::as_str))
    .any(|field| field.to_lowercase().contains(needle))
}

/// Count keys, most used first, ties by key
fn facets<'k>(
    keys: impl Iterator<Item = &'k str>,
    label: impl Fn(&str) -> String,
) -> Vec<FacetCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for key in keys {
        *counts.entry(key).or_default() += 1;
    }

    let mut facets: Vec<FacetCount> = counts
        .into_iter()
        .map(|(key, count)| FacetCount {
            key: key.to_string(),
            label: label(key),
            count,
        })
        .collect();
    facets.sort_by(|a, b| b.count.cmp(&a.count));
    facets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::services::testing::{context, context_with, post, register};
    use crate::types::{NewPrompt, User};
    use chrono::Duration;
    use proptest::prelude::*;

    fn seed(ctx: &ServiceContext) -> (User, Vec<Prompt>) {
        let alice = register(ctx, "alice");
        let specs = [
            ("Blog Outline", "writing", "gpt4", "blog, seo"),
            ("Logo Ideas", "image", "midjourney", "logo"),
            ("Bug Hunter", "development", "claude", "rust, debugging"),
            ("Essay Grader", "education", "gpt4", "essay"),
        ];
        let prompts = specs
            .iter()
            .map(|(title, category, model, tags)| {
                ctx.prompts()
                    .create(
                        &alice,
                        NewPrompt {
                            title: title.to_string(),
                            content: format!("Help me with {}", title.to_lowercase()),
                            category: Some(category.to_string()),
                            ai_model: Some(model.to_string()),
                            tags: Some(tags.to_string()),
                            ..Default::default()
                        },
                    )
                    .unwrap()
            })
            .collect();
        (alice, prompts)
    }

    fn titles(page: &FeedPage<Prompt>) -> Vec<&str> {
        page.items.iter().map(|p| p.title.as_str()).collect()
    }

    #[test]
    fn test_recent_feed_newest_first() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        for title in ["Old", "Middle", "New"] {
            post(&ctx, &alice, title);
            clock.advance(Duration::minutes(1));
        }

        let page = ctx.feed().feed(&FeedQuery::default()).unwrap();
        assert_eq!(titles(&page), vec!["New", "Middle", "Old"]);
        assert_eq!(page.per_page, 12);
        assert!(!page.has_next);
    }

    #[test]
    fn test_filters_and_search() {
        let (ctx, _) = context();
        seed(&ctx);
        let feed = ctx.feed();

        let page = feed
            .feed(&FeedQuery {
                ai_model: Some("gpt4".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total, 2);

        let page = feed
            .feed(&FeedQuery {
                search: Some("RUST".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&page), vec!["Bug Hunter"]);

        let page = feed
            .feed(&FeedQuery {
                search: Some("image".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&page), vec!["Logo Ideas"]);

        let page = feed
            .feed(&FeedQuery {
                category: Some("writing".to_string()),
                search: Some("logo".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.total, 0);
    }

    #[test]
    fn test_trending_sorts_by_likes() {
        let (ctx, _) = context();
        let (_, prompts) = seed(&ctx);
        let bob = register(&ctx, "bob");
        let carol = register(&ctx, "carol");
        ctx.interactions().toggle_like(&bob, &prompts[1].id).unwrap();
        ctx.interactions().toggle_like(&carol, &prompts[1].id).unwrap();
        ctx.interactions().toggle_like(&bob, &prompts[0].id).unwrap();

        let page = ctx
            .feed()
            .feed(&FeedQuery {
                sort: FeedSort::Trending,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.items[0].id, prompts[1].id);
        assert_eq!(page.items[1].id, prompts[0].id);
    }

    #[test]
    fn test_popular_sorts_by_views_ties_newest_first() {
        let (ctx, clock) = context();
        let alice = register(&ctx, "alice");
        let mut prompts = Vec::new();
        for title in ["Oldest", "Older", "Newer", "Newest"] {
            prompts.push(post(&ctx, &alice, title));
            clock.advance(Duration::minutes(1));
        }
        let bob = register(&ctx, "bob");
        let interactions = ctx.interactions();
        interactions.open_prompt(&bob, &prompts[0].id).unwrap();
        interactions.open_prompt(&bob, &prompts[0].id).unwrap();
        interactions.open_prompt(&bob, &prompts[2].id).unwrap();

        let page = ctx
            .feed()
            .feed(&FeedQuery {
                sort: FeedSort::Popular,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(titles(&page), vec!["Oldest", "Newer", "Newest", "Older"]);
    }

    #[test]
    fn test_per_page_capped_at_max_page_size() {
        let (ctx, _) = context();
        seed(&ctx);
        let page = ctx
            .feed()
            .feed(&FeedQuery {
                per_page: Some(500),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.per_page, 50);

        let mut config = Config::default();
        config.content.default_page_size = 2;
        config.content.max_page_size = 3;
        let (ctx, _) = context_with(config);
        seed(&ctx);
        let page = ctx
            .feed()
            .feed(&FeedQuery {
                per_page: Some(10),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(page.per_page, 3);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.total_pages, 2);
        assert!(page.has_next);
    }

    #[test]
    fn test_archived_prompts_hidden() {
        let (ctx, _) = context();
        let (alice, prompts) = seed(&ctx);
        ctx.prompts().archive(&alice, &prompts[0].id).unwrap();

        assert_eq!(ctx.feed().feed(&FeedQuery::default()).unwrap().total, 3);
    }

    #[test]
    fn test_facets_count_published() {
        let (ctx, _) = context();
        seed(&ctx);

        let models = ctx.feed().ai_models().unwrap();
        assert_eq!(models[0].key, "gpt4");
        assert_eq!(models[0].count, 2);
        assert_eq!(models[0].label, "ChatGPT");
        assert_eq!(models.len(), 3);

        let categories = ctx.feed().categories().unwrap();
        assert_eq!(categories.iter().map(|c| c.count).sum::<usize>(), 4);
    }

    #[test]
    fn test_suggestions() {
        let (ctx, _) = context();
        seed(&ctx);
        let feed = ctx.feed();

        assert_eq!(feed.suggestions("lo", 5).unwrap(), vec!["Blog", "Logo"]);
        assert_eq!(feed.suggestions("e", 2).unwrap().len(), 2);
        assert!(feed.suggestions("  ", 5).unwrap().is_empty());
    }

    #[test]
    fn test_paginate_past_end() {
        let page = FeedPage::paginate((0..5).collect::<Vec<_>>(), 3, 2);
        assert_eq!(page.items, vec![4]);
        assert!(!page.has_next);
        assert!(page.has_prev);

        let page = FeedPage::paginate((0..5).collect::<Vec<_>>(), 9, 2);
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 3);
    }

    proptest! {
        #[test]
        fn prop_pages_partition_items(total in 0usize..60, per_page in 1usize..15) {
            let items: Vec<usize> = (0..total).collect();
            let pages = total.div_ceil(per_page).max(1);

            let mut seen = Vec::new();
            for page in 1..=pages {
                let p = FeedPage::paginate(items.clone(), page, per_page);
                prop_assert!(p.items.len() <= per_page);
                prop_assert_eq!(p.has_next, page < p.total_pages);
                prop_assert_eq!(p.has_prev, page > 1);
                seen.extend(p.items);
            }
            prop_assert_eq!(seen, items);
        }
    }
}
