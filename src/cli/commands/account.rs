//! Account Commands
//!
//! Usage:
//!   promptub register <username> [--password <pw>]
//!   promptub login <username> [--password <pw>]
//!   promptub logout
//!   promptub whoami [-f json]
//!   promptub passwd
//!   promptub ban <username> [--lift]

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json, read_password};
use crate::types::{Result, UserStatus};

pub fn register(username: &str, password: Option<String>) -> Result<()> {
    let ctx = CommandContext::load()?;
    let password = read_password(password, "Password: ")?;

    let user = ctx.services.auth().register(username, &password)?;

    let out = Output::new();
    out.success(&format!("Welcome, {}!", user.username));
    out.field("Points", user.points);
    out.field("Level", user.level());
    println!();
    println!("Run 'promptub login {}' to start a session.", user.username);
    Ok(())
}

pub fn login(username: &str, password: Option<String>) -> Result<()> {
    let ctx = CommandContext::load()?;
    let password = read_password(password, "Password: ")?;

    let before = ctx.services.users().find_by_username(username).ok();
    let session = ctx.services.auth().login(username, &password)?;
    ctx.save_session(&session.token)?;
    let user = ctx.services.users().get(&session.user_id)?;

    let out = Output::new();
    out.success(&format!("Logged in as {}", user.username));
    if let Some(before) = before
        && user.points > before.points
    {
        out.info(&format!(
            "Daily login reward: +{} points (streak {} days)",
            user.points - before.points,
            user.login_streak
        ));
    }
    out.field("Points", user.points);
    out.field(
        "Session until",
        session.expires_at.format("%Y-%m-%d %H:%M UTC"),
    );
    Ok(())
}

pub fn logout() -> Result<()> {
    let ctx = CommandContext::load()?;
    let out = Output::new();

    match ctx.saved_session()? {
        Some(token) => {
            ctx.services.auth().logout(&token)?;
            ctx.clear_session()?;
            out.success("Logged out");
        }
        None => out.info("Not logged in"),
    }
    Ok(())
}

pub fn whoami(format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;

    if format.is_json() {
        return print_json(&user);
    }

    let out = Output::new();
    out.header(&user.username);
    out.field("Level", user.level());
    out.field("Points", user.points);
    out.field("Login streak", format!("{} days", user.login_streak));
    out.field("Member since", user.created_at.format("%Y-%m-%d"));
    Ok(())
}

pub fn passwd(current: Option<String>, new: Option<String>) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.require_user()?;

    let current = read_password(current, "Current password: ")?;
    let new = read_password(new, "New password: ")?;
    ctx.services.auth().change_password(&user, &current, &new)?;

    Output::new().success("Password changed");
    Ok(())
}

/// Ban a member or lift the ban; their sessions stop working on next use
pub fn ban(username: &str, lift: bool) -> Result<()> {
    let ctx = CommandContext::load()?;
    let user = ctx.services.users().find_by_username(username)?;
    let status = if lift {
        UserStatus::Active
    } else {
        UserStatus::Banned
    };
    ctx.services.auth().set_status(&user.id, status)?;

    let out = Output::new();
    if lift {
        out.success(&format!("Lifted the ban on {}", user.username));
    } else {
        out.success(&format!("Banned {}", user.username));
    }
    Ok(())
}
