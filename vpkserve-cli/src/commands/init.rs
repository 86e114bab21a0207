//! Init command - write a starter configuration file.

use vpkserve::config::ConfigFile;

use crate::error::CliError;
use crate::runner::GlobalOptions;

/// Run the init command.
pub fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let path = options.config_path();

    if path.exists() {
        println!("Configuration file already exists:");
        println!("  {}", path.display());
        println!();
        println!("Remove it first to regenerate the template.");
        return Ok(());
    }

    ConfigFile::save_template(&path)?;

    println!("Configuration file: {}", path.display());
    println!();
    println!("Add one [collection.<alias>] section per game, then run 'vpkserve serve'.");
    Ok(())
}
