//! Concat command - print every file with a given extension.

use std::io::{self, Write};

use vpkserve::{ContentResolver, VpkCodec};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the concat command.
pub fn run(options: &GlobalOptions, alias: &str, extension: &str) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("concat");
    let index = runner.build_index()?;
    let text = ContentResolver::new(&index, &VpkCodec).concat_by_extension(alias, extension)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.flush())
        .map_err(|source| CliError::Output { path: None, source })
}
