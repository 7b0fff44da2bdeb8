//! Status Command
//!
//! Display community status and maintenance tools.

use crate::cli::ui::Output;
use crate::cli::util::{CommandContext, OutputFormat, print_json};
use crate::config::ConfigLoader;
use crate::types::{Result, to_timestamp};

pub fn run(format: OutputFormat, detailed: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let json_output = format.is_json();

    if !ConfigLoader::is_project_initialized(&root) {
        if json_output {
            return print_json(&serde_json::json!({ "status": "not_initialized" }));
        }
        println!("Promptub Status");
        println!("══════════════════════════════════════");
        println!("Not initialized. Run 'promptub init' first.");
        // informational: not an error
        return Ok(());
    }

    let ctx = CommandContext::load_in(&root)?;
    let stats = ctx
        .services
        .db
        .stats(to_timestamp(ctx.services.now()))?;
    let user = ctx.optional_user()?;
    let db_path = ConfigLoader::database_path(&root, ctx.config());

    if json_output {
        return print_json(&serde_json::json!({
            "status": "initialized",
            "database": db_path,
            "stats": stats,
            "logged_in_as": user.as_ref().map(|u| u.username.as_str()),
        }));
    }

    println!("Promptub Status");
    println!("══════════════════════════════════════");
    match &user {
        Some(user) => println!("Logged in as: {} ({} points)", user.username, user.points),
        None => println!("Logged in as: (guest)"),
    }
    println!();
    println!("Community:");
    println!("  Members:      {}", stats.users);
    println!("  Prompts:      {}", stats.prompts);
    println!("  Comments:     {}", stats.comments);
    println!("  Interactions: {}", stats.interactions);

    if detailed {
        println!();
        println!("Storage:");
        println!("  Database:        {}", db_path.display());
        println!("  Schema version:  {}", stats.schema_version);
        println!("  Ledger entries:  {}", stats.ledger_entries);
        println!("  Active sessions: {}", stats.active_sessions);
    }

    Ok(())
}

/// Recompute prompt counters from the interaction and comment ledgers
pub fn resync() -> Result<()> {
    let ctx = CommandContext::load()?;
    let changed = ctx.services.interactions().resync_counters()?;

    let out = Output::new();
    if changed == 0 {
        out.success("All prompt counters are in sync");
    } else {
        out.success(&format!("Resynchronized counters of {} prompt(s)", changed));
    }
    Ok(())
}
