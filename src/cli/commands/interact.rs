//! Interaction Commands
//!
//! Like, bookmark and share prompts.

use crate::cli::ui::Output;
use crate::cli::util::CommandContext;
use crate::types::Result;

pub fn like(id: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let outcome = ctx.services.interactions().toggle_like(&user, id)?;

    let out = Output::new();
    if outcome.active {
        out.success(&format!("Liked ({} likes)", outcome.count));
    } else {
        out.success(&format!("Like removed ({} likes)", outcome.count));
    }
    Ok(())
}

pub fn bookmark(id: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let outcome = ctx.services.interactions().toggle_bookmark(&user, id)?;

    let out = Output::new();
    if outcome.active {
        out.success("Bookmarked");
    } else {
        out.success("Bookmark removed");
    }
    Ok(())
}

/// Guests may share too; only members earn the reward
pub fn share(id: &str) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.optional_user()?;
    let before = user.as_ref().map(|u| u.points);

    let count = ctx.services.interactions().record_share(user.as_ref(), id)?;

    let out = Output::new();
    out.success(&format!("Shared ({} shares)", count));
    if let (Some(user), Some(before)) = (user, before) {
        let after = ctx.services.points().balance(&user.id)?;
        if after > before {
            out.info(&format!("+{} points for sharing", after - before));
        }
    }
    Ok(())
}
