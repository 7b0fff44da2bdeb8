//! Points Commands
//!
//! Usage:
//!   promptub points balance
//!   promptub points history [-n 20]
//!   promptub points audit [--repair]
//!   promptub leaderboard [-n 10]
//!   promptub profile [username]

use console::style;

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::types::Result;

pub fn balance(format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let points = ctx.services.points();

    let quota = points.daily_quota(&user);
    let free_left = points.free_views_left(&user)?;
    let earned = points.earned_today(&user.id)?;
    let limit = ctx.config().points.daily_limit;

    if format.is_json() {
        return print_json(&serde_json::json!({
            "points": user.points,
            "level": user.level(),
            "next_level_at": user.level().next_threshold(),
            "free_views_left": free_left,
            "daily_quota": quota,
            "earned_today": earned,
            "daily_limit": limit,
        }));
    }

    let out = Output::new();
    out.header(&format!("{} · {}", user.username, user.level()));
    out.field("Points", user.points);
    if let Some(next) = user.level().next_threshold() {
        out.field("Next level", format!("{} more points", next - user.points));
    }
    out.field("Free views", format!("{}/{} left today", free_left, quota));
    out.field("Earned today", format!("{}/{}", earned, limit));
    Ok(())
}

pub fn history(limit: usize, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;
    let entries = ctx.services.points().history(&user.id, limit)?;

    if format.is_json() {
        return print_json(&entries);
    }

    let out = Output::new();
    out.section("Points history");
    for entry in &entries {
        let delta = if entry.delta >= 0 {
            style(format!("{:+}", entry.delta)).green()
        } else {
            style(format!("{:+}", entry.delta)).red()
        };
        println!(
            "  {}  {:>6}  {}",
            style(entry.created_at.format("%Y-%m-%d %H:%M")).dim(),
            delta,
            entry.reason.label()
        );
    }
    if entries.is_empty() {
        println!("  {}", style("no entries").dim());
    }
    Ok(())
}

/// Compare cached balances with the ledger; optionally fix them
pub fn audit(repair: bool, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let points = ctx.services.points();
    let mismatches = if repair {
        points.repair()?
    } else {
        points.audit()?
    };

    if format.is_json() {
        return print_json(&mismatches);
    }

    let out = Output::new();
    if mismatches.is_empty() {
        out.success("All balances match the ledger");
        return Ok(());
    }
    for m in &mismatches {
        out.warning(&format!(
            "{}: cached {} but ledger sums to {}",
            m.username, m.cached, m.ledger
        ));
    }
    if repair {
        out.success(&format!("Repaired {} balance(s)", mismatches.len()));
    } else {
        out.info("Run with --repair to reset balances to the ledger");
    }
    Ok(())
}

pub fn leaderboard(limit: usize, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let users = ctx.services.users().leaderboard(limit)?;

    if format.is_json() {
        return print_json(&users);
    }

    let out = Output::new();
    out.section("Leaderboard");
    for (rank, user) in users.iter().enumerate() {
        println!(
            "  {:>3}. {:<20} {:>7}  {}",
            rank + 1,
            user.username,
            user.points,
            style(user.level()).dim()
        );
    }
    Ok(())
}

/// Someone's profile, or your own without a name
pub fn profile(username: Option<&str>, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = match username {
        Some(name) => ctx.services.users().find_by_username(name)?,
        None => ctx.require_user()?,
    };
    let profile = ctx.services.users().profile(&user.id)?;
    let viewer = ctx.optional_user()?;
    let own = viewer.is_some_and(|v| v.id == user.id);
    let prompts: Vec<_> = ctx
        .services
        .prompts()
        .by_author(&user.id)?
        .into_iter()
        .filter(|p| own || p.is_published())
        .collect();

    if format.is_json() {
        return print_json(&serde_json::json!({
            "profile": profile,
            "prompts": prompts,
        }));
    }

    let out = Output::new();
    out.header(&format!("{} · {}", profile.user.username, profile.level));
    out.field("Points", profile.user.points);
    out.field("Prompts", profile.prompt_count);
    out.field("Likes received", profile.likes_received);
    out.field("Login streak", format!("{} days", profile.user.login_streak));
    out.field("Free views", profile.free_views_left_today);
    out.field("Earned today", profile.earned_today);

    if !prompts.is_empty() {
        out.section("Prompts");
        for prompt in &prompts {
            let status = if prompt.is_published() { "" } else { " (archived)" };
            println!(
                "  {}{}  {}",
                prompt.title,
                style(status).yellow(),
                style(&prompt.id).dim()
            );
        }
    }
    Ok(())
}
