//! vpkserve CLI - Command-line interface
//!
//! Indexes the configured VPK collections and either serves them over the
//! JSON API or answers one lookup from the command line.

mod commands;
mod error;
mod runner;

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use error::CliError;
use runner::GlobalOptions;

#[derive(Parser)]
#[command(name = "vpkserve")]
#[command(version = vpkserve::VERSION)]
#[command(about = "Serve files packed inside VPK archives", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ~/.vpkserve/config.ini)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging for vpkserve
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Index all collections and serve the JSON API
    Serve {
        /// Listen address (overrides [server] listen)
        #[arg(long, value_name = "ADDR")]
        listen: Option<SocketAddr>,
    },

    /// List configured collections
    Collections,

    /// List the virtual files of a collection in index order
    Files {
        /// Collection alias
        alias: String,
    },

    /// Extract one file
    Get {
        /// Collection alias
        alias: String,

        /// Virtual path inside the collection
        path: String,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print every file with the given extension, each preceded by its path
    Concat {
        /// Collection alias
        alias: String,

        /// File extension, with or without the leading dot
        extension: String,
    },

    /// Write a starter configuration file
    Init,

    /// Inspect configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

fn main() {
    let cli = Cli::parse();
    let options = GlobalOptions {
        config: cli.config,
        verbose: cli.verbose,
    };

    let result: Result<(), CliError> = match cli.command {
        Commands::Serve { listen } => {
            commands::serve::run(&options, commands::serve::ServeArgs { listen })
        }
        Commands::Collections => commands::collections::run(&options),
        Commands::Files { alias } => commands::files::run(&options, &alias),
        Commands::Get {
            alias,
            path,
            output,
        } => commands::get::run(&options, &alias, &path, output.as_deref()),
        Commands::Concat { alias, extension } => {
            commands::concat::run(&options, &alias, &extension)
        }
        Commands::Init => commands::init::run(&options),
        Commands::Config(command) => commands::config::run(&options, command),
    };

    if let Err(e) = result {
        e.exit();
    }
}
