//! Init Command
//!
//! Create the community data directory in the current directory.

use crate::cli::ui::Output;
use crate::cli::util::create_database;
use crate::config::{ConfigLoader, PROJECT_DIR_NAME};
use crate::types::{HubError, Result, to_timestamp};

pub fn run(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;

    if ConfigLoader::is_project_initialized(&root) && !force {
        return Err(HubError::Config(
            "Already initialized. Use --force to re-run initialization.".to_string(),
        ));
    }

    ConfigLoader::init_project(&root, false)?;

    if let Err(e) = ConfigLoader::init_global(false) {
        tracing::debug!("Global config init skipped: {}", e);
    }

    let config = ConfigLoader::load_in(&root)?;
    let db = create_database(&root, &config)?;

    let out = Output::new();
    out.success(&format!("Initialized promptub in {}/", PROJECT_DIR_NAME));
    let stats = db.stats(to_timestamp(chrono::Utc::now()))?;
    println!("  Schema version: {}", stats.schema_version);
    println!();
    println!("Next steps:");
    println!("  1. Run 'promptub register <name>' to create an account");
    println!(
        "     (new members receive {} welcome points)",
        config.points.welcome_bonus
    );
    println!("  2. Run 'promptub post' to share your first prompt");

    Ok(())
}
