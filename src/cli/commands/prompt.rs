//! Prompt Commands
//!
//! Usage:
//!   promptub post --title <t> [--content <c>] [--category <k>] [--model <k>] [--tags a,b]
//!   promptub edit <id> [--title <t>] ...
//!   promptub archive <id> [--restore]
//!   promptub delete <id>
//!   promptub show <id> [-f json]

use std::io::Read;

use console::style;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::types::{NewPrompt, PromptUpdate, Result, ViewCharge};

/// Fields given on the command line for `post` and `edit`
#[derive(Debug, Clone, Default)]
pub struct PromptFields {
    pub title: Option<String>,
    /// `-` reads the content from stdin
    pub content: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub ai_model: Option<String>,
    pub tags: Option<String>,
}

impl PromptFields {
    fn resolve_content(&mut self) -> Result<()> {
        if self.content.as_deref() == Some("-") {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            self.content = Some(buf);
        }
        Ok(())
    }
}

pub fn post(mut fields: PromptFields) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    if fields.content.is_none() {
        fields.content = Some("-".to_string());
    }
    fields.resolve_content()?;

    let prompt = ctx.services.prompts().create(
        &user,
        NewPrompt {
            title: fields.title.unwrap_or_default(),
            content: fields.content.unwrap_or_default(),
            description: fields.description,
            category: fields.category,
            ai_model: fields.ai_model,
            tags: fields.tags,
        },
    )?;

    let balance = ctx.services.points().balance(&user.id)?;
    let out = Output::new();
    out.success(&format!("Published '{}'", prompt.title));
    out.field("Id", &prompt.id);
    out.field(
        "Reward",
        format!("+{} points (balance {})", balance - user.points, balance),
    );
    Ok(())
}

pub fn edit(id: &str, mut fields: PromptFields) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    fields.resolve_content()?;

    let changes = PromptUpdate {
        title: fields.title,
        content: fields.content,
        description: fields.description,
        category: fields.category,
        ai_model: fields.ai_model,
        tags: fields.tags,
    };
    let out = Output::new();
    if changes.is_empty() {
        out.info("Nothing to change");
        return Ok(());
    }

    let prompt = ctx.services.prompts().update(&user, id, changes)?;
    out.success(&format!("Updated '{}'", prompt.title));
    Ok(())
}

pub fn archive(id: &str, restore: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let prompts = ctx.services.prompts();

    let out = Output::new();
    if restore {
        let prompt = prompts.restore(&user, id)?;
        out.success(&format!("Restored '{}' to the feed", prompt.title));
    } else {
        let prompt = prompts.archive(&user, id)?;
        out.success(&format!("Archived '{}'", prompt.title));
    }
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    ctx.services.prompts().delete(&user, id)?;
    Output::new().success("Prompt deleted with its comments and interactions");
    Ok(())
}

/// Open the detail view; this is what costs a free view or points
pub fn show(id: &str, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let detail = ctx.services.interactions().open_prompt(&user, id)?;

    if format.is_json() {
        return print_json(&detail);
    }

    let catalog = &ctx.config().catalog;
    let prompt = &detail.prompt;
    let out = Output::new();

    out.header(&prompt.title);
    out.field("Author", &prompt.author_name);
    out.field(
        "Category",
        catalog
            .category(&prompt.category)
            .map(|c| c.display())
            .unwrap_or_else(|| prompt.category.clone()),
    );
    out.field("AI model", catalog.ai_model_label(&prompt.ai_model));
    if !prompt.tags.is_empty() {
        out.field("Tags", prompt.tags.join(", "));
    }
    out.field("Created", prompt.created_at.format("%Y-%m-%d %H:%M"));
    if !prompt.description.is_empty() {
        println!();
        println!("{}", style(&prompt.description).italic());
    }

    out.section("Prompt");
    println!("{}", prompt.content);

    println!();
    println!(
        "{} {}  {} {}  ↗ {}  👁 {}",
        if detail.liked { "♥" } else { "♡" },
        prompt.stats.likes,
        if detail.bookmarked { "★" } else { "☆" },
        prompt.stats.bookmarks,
        prompt.stats.shares,
        prompt.stats.views
    );
    match detail.charge {
        ViewCharge::OwnPrompt => {}
        ViewCharge::Free { remaining } => {
            out.info(&format!("Free view ({} left today)", remaining))
        }
        ViewCharge::Paid { cost, balance } => out.warning(&format!(
            "Charged {} point(s) for this view, balance {}",
            cost, balance
        )),
    }

    out.section(&format!("Comments ({})", prompt.stats.comments));
    out.thread(&detail.thread);
    Ok(())
}
