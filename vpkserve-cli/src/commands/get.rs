//! Get command - extract one file from a collection.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use vpkserve::{ContentResolver, VpkCodec};

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the get command.
pub fn run(
    options: &GlobalOptions,
    alias: &str,
    path: &str,
    output: Option<&Path>,
) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("get");
    let index = runner.build_index()?;
    let data = ContentResolver::new(&index, &VpkCodec).resolve(alias, path)?;

    match output {
        Some(file) => {
            fs::write(file, &data).map_err(|source| CliError::Output {
                path: Some(file.to_path_buf()),
                source,
            })?;
            eprintln!("Wrote {} bytes to {}", data.len(), file.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout
                .write_all(&data)
                .and_then(|_| stdout.flush())
                .map_err(|source| CliError::Output { path: None, source })?;
        }
    }
    Ok(())
}
