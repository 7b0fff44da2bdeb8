//! Comment Commands
//!
//! Usage:
//!   promptub comment <prompt> <text>
//!   promptub reply <comment> <text>
//!   promptub uncomment <comment>
//!   promptub comment-like <comment>
//!   promptub comments <prompt> [--flat] [-f json]

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::types::Result;

pub fn comment(prompt_id: &str, text: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let comment = ctx.services.comments().add(&user, prompt_id, text, None)?;

    let out = Output::new();
    out.success("Comment posted");
    out.field("Id", &comment.id);
    Ok(())
}

/// Reply to a comment; the prompt is taken from the parent
pub fn reply(parent_id: &str, text: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;

    let prompt_id = ctx.services.comments().get(parent_id)?.prompt_id;
    let comment = ctx
        .services
        .comments()
        .add(&user, &prompt_id, text, Some(parent_id))?;

    let out = Output::new();
    out.success("Reply posted");
    out.field("Id", &comment.id);
    Ok(())
}

pub fn uncomment(comment_id: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    ctx.services.comments().delete(&user, comment_id)?;
    Output::new().success("Comment deleted");
    Ok(())
}

pub fn like(comment_id: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let outcome = ctx.services.comments().toggle_like(&user, comment_id)?;

    let verb = if outcome.active { "Liked" } else { "Like removed" };
    Output::new().success(&format!("{} ({} likes)", verb, outcome.count));
    Ok(())
}

/// Comments are public; listing them costs no view
pub fn list(prompt_id: &str, flat: bool, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let viewer = ctx.optional_user()?;
    let comments = ctx.services.comments();
    let out = Output::new();

    if flat {
        let list = comments.list(viewer.as_ref(), prompt_id)?;
        if format.is_json() {
            return print_json(&list);
        }
        out.section(&format!("Comments ({})", list.len()));
        for comment in &list {
            out.comment(comment, 2);
        }
        return Ok(());
    }

    let thread = comments.thread(viewer.as_ref(), prompt_id)?;
    if format.is_json() {
        return print_json(&thread);
    }
    out.section(&format!("Comments ({})", thread.active_count()));
    out.thread(&thread);
    Ok(())
}
