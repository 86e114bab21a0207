//! Collections command - list configured collections.

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the collections command.
pub fn run(options: &GlobalOptions) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    let registry = runner.config().registry()?;

    if registry.is_empty() {
        println!("No collections configured.");
        println!(
            "Add a [collection.<alias>] section to {}",
            runner.config_path().display()
        );
        return Ok(());
    }

    for summary in registry.summaries() {
        println!("{:<16} {}", summary.alias, summary.display_name);
    }
    Ok(())
}
