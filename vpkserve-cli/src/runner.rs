//! Shared setup for commands that need configuration and the content index.

use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::info;
use vpkserve::config::{config_file_path, ConfigFile};
use vpkserve::logging::{init_logging, LoggingGuard};
use vpkserve::{ContentIndex, VpkCodec};

use crate::error::CliError;

/// Options accepted by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub verbose: bool,
}

impl GlobalOptions {
    /// Config file in effect: `--config` or the default location.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(config_file_path)
    }
}

/// Loaded configuration plus installed logging.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the configuration file and install logging.
    pub fn new(options: &GlobalOptions) -> Result<Self, CliError> {
        let config_path = options.config_path();
        if !config_path.exists() {
            return Err(CliError::Config(format!(
                "Configuration file {} not found. Run 'vpkserve init' to create one.",
                config_path.display()
            )));
        }

        let config = ConfigFile::load_from(&config_path)?;
        let logging = init_logging(&config.logging, options.verbose)?;

        Ok(Self {
            config,
            config_path,
            _logging: logging,
        })
    }

    /// The loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Path the configuration was loaded from.
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Log the startup banner for `command`.
    pub fn log_startup(&self, command: &str) {
        info!(
            version = vpkserve::VERSION,
            command,
            config = %self.config_path.display(),
            content_root = %self.config.server.content_root.display(),
            "vpkserve starting"
        );
    }

    /// Scan and index every configured collection.
    pub fn build_index(&self) -> Result<ContentIndex, CliError> {
        let registry = self.config.registry()?;
        let start = Instant::now();
        let index = ContentIndex::build(registry, &VpkCodec);
        info!(
            collections = index.registry().len(),
            files = index.file_count(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Content indexed"
        );
        Ok(index)
    }
}
