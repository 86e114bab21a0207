//! Configuration inspection commands.
//!
//! Provides `config path` and `config show`.

use clap::Subcommand;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Show the resolved server settings and collection search roots
    Show,
}

/// Run a config subcommand.
pub fn run(options: &GlobalOptions, command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(options),
        ConfigCommands::Show => run_show(options),
    }
}

/// Show the configuration file path.
fn run_path(options: &GlobalOptions) -> Result<(), CliError> {
    println!("{}", options.config_path().display());
    Ok(())
}

/// Show the resolved configuration.
fn run_show(options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    let config = runner.config();
    let registry = config.registry()?;

    println!("[server]");
    println!("  listen       = {}", config.server.listen);
    println!("  content_root = {}", config.server.content_root.display());
    println!();
    println!("[logging]");
    match &config.logging.directory {
        Some(dir) => println!("  directory    = {}", dir.display()),
        None => println!("  directory    = (not set)"),
    }
    println!("  level        = {}", config.logging.level);

    for collection in registry.iter() {
        println!();
        println!("[collection.{}]", collection.alias());
        println!("  name         = {}", collection.display_name());
        if let Some(app_id) = collection.app_id() {
            println!("  app_id       = {}", app_id);
        }
        println!(
            "  single files = {}",
            if collection.single_file_archives() { "yes" } else { "no" }
        );
        for root in collection.search_roots() {
            let status = if root.is_dir() { "" } else { "  (missing)" };
            println!("  search root  = {}{}", root.display(), status);
        }
    }

    Ok(())
}
