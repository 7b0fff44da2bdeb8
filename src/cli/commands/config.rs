//! Config Command
//!
//! Manage promptub configuration.
//!
//! Usage:
//!   promptub config show [-g] [-f json]
//!   promptub config path
//!   promptub config init [-g] [--force]

use crate::cli::util::OutputFormat;
use crate::config::ConfigLoader;
use crate::types::Result;

/// Show configuration
pub fn show(global: bool, format: OutputFormat) -> Result<()> {
    if global {
        if let Some(global_path) = ConfigLoader::global_config_path() {
            if global_path.exists() {
                let content = std::fs::read_to_string(&global_path)?;
                println!("# Global Config: {}\n", global_path.display());
                println!("{}", content);
            } else {
                println!("No global config found.");
                println!("Run 'promptub config init --global' to create one.");
            }
        } else {
            println!("Cannot determine global config directory.");
        }
        return Ok(());
    }

    // merged effective config
    let root = std::env::current_dir()?;
    let config = ConfigLoader::load_in(&root)?;
    println!("{}", ConfigLoader::render(&config, format.is_json())?);
    Ok(())
}

/// Show configuration paths
pub fn path() -> Result<()> {
    let root = std::env::current_dir()?;
    ConfigLoader::show_path(&root);
    Ok(())
}

/// Initialize global configuration
pub fn init_global(force: bool) -> Result<()> {
    let config_path = ConfigLoader::init_global(force)?;
    println!("✓ Initialized global configuration");
    println!("  Config: {}", config_path.display());
    Ok(())
}

/// Initialize project configuration
pub fn init_project(force: bool) -> Result<()> {
    let root = std::env::current_dir()?;
    let dir = ConfigLoader::init_project(&root, force)?;
    println!("✓ Initialized project configuration");
    println!("  Directory: {}", dir.display());
    println!(
        "  Config:    {}",
        ConfigLoader::project_config_path(&root).display()
    );
    Ok(())
}
