//! Feed Commands
//!
//! Browse, search and facet the published prompts.

use console::style;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::services::{FacetCount, FeedQuery};
use crate::types::Result;

pub fn feed(query: FeedQuery, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let page = ctx.services.feed().feed(&query)?;

    if format.is_json() {
        return print_json(&page);
    }

    let out = Output::new();
    if page.items.is_empty() {
        out.info("No prompts match");
        return Ok(());
    }

    for prompt in &page.items {
        println!();
        out.card(prompt, &ctx.config().catalog);
    }
    println!();
    println!(
        "{}",
        style(format!(
            "Page {}/{} · {} prompts{}{}",
            page.page,
            page.total_pages.max(1),
            page.total,
            if page.has_prev { " · --page for previous" } else { "" },
            if page.has_next { " · more on the next page" } else { "" },
        ))
        .dim()
    );
    Ok(())
}

pub fn facets(format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let feed = ctx.services.feed();
    let categories = feed.categories()?;
    let models = feed.ai_models()?;

    if format.is_json() {
        return print_json(&serde_json::json!({
            "categories": categories,
            "ai_models": models,
        }));
    }

    let out = Output::new();
    print_facets(&out, "Categories", &categories);
    print_facets(&out, "AI models", &models);
    Ok(())
}

fn print_facets(out: &Output, title: &str, facets: &[FacetCount]) {
    out.section(title);
    if facets.is_empty() {
        println!("  {}", style("none yet").dim());
    }
    for facet in facets {
        println!("  {:<24} {:>4}  {}", facet.label, facet.count, style(&facet.key).dim());
    }
}

pub fn suggest(query: &str, limit: usize, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let suggestions = ctx.services.feed().suggestions(query, limit)?;

    if format.is_json() {
        return print_json(&suggestions);
    }
    for suggestion in suggestions {
        println!("{}", suggestion);
    }
    Ok(())
}

pub fn bookmarks(format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let prompts = ctx.services.interactions().bookmarks(&user)?;

    if format.is_json() {
        return print_json(&prompts);
    }

    let out = Output::new();
    if prompts.is_empty() {
        out.info("No bookmarks yet");
        return Ok(());
    }
    out.header(&format!("Bookmarks ({})", prompts.len()));
    for prompt in &prompts {
        println!();
        out.card(prompt, &ctx.config().catalog);
    }
    Ok(())
}
