//! Files command - list the virtual files of one collection.

use std::io::{self, Write};

use vpkserve::ContentResolver;

use crate::error::CliError;
use crate::runner::{CliRunner, GlobalOptions};

/// Run the files command.
pub fn run(options: &GlobalOptions, alias: &str) -> Result<(), CliError> {
    let runner = CliRunner::new(options)?;
    runner.log_startup("files");
    let index = runner.build_index()?;
    let resolver = ContentResolver::new(&index, &vpkserve::VpkCodec);

    let files = resolver.list_files(alias)?;
    let output_err = |source| CliError::Output { path: None, source };

    let mut out = io::BufWriter::new(io::stdout().lock());
    for file in files {
        writeln!(out, "{}", file).map_err(output_err)?;
    }
    out.flush().map_err(output_err)?;

    if let Some(collection) = index.collection(alias) {
        for skipped in collection.skipped() {
            eprintln!("warning: {}", skipped);
        }
    }
    Ok(())
}
