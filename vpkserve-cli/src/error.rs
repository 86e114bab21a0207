//! CLI error type.

use std::io;
use std::path::PathBuf;
use std::process;

use vpkserve::config::ConfigError;
use vpkserve::logging::LoggingError;
use vpkserve::ResolveError;

/// Errors surfaced to the user by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Configuration problem with a user-facing explanation.
    Config(String),

    /// Configuration file failed to load or validate.
    ConfigFile(ConfigError),

    /// Logging could not be initialized.
    Logging(LoggingError),

    /// A lookup against the index failed.
    Resolve(ResolveError),

    /// Writing output failed.
    Output { path: Option<PathBuf>, source: io::Error },

    /// The HTTP server failed to start or stopped with an error.
    Serve(String),
}

impl CliError {
    /// Print the error and exit with a non-zero status.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);
        process::exit(1);
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "{}", msg),
            Self::ConfigFile(e) => write!(f, "configuration error: {}", e),
            Self::Logging(e) => write!(f, "failed to initialize logging: {}", e),
            Self::Resolve(e) => write!(f, "{}", e),
            Self::Output { path: Some(path), source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
            Self::Output { path: None, source } => {
                write!(f, "failed to write output: {}", source)
            }
            Self::Serve(msg) => write!(f, "server error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigFile(e) => Some(e),
            Self::Logging(e) => Some(e),
            Self::Resolve(e) => Some(e),
            Self::Output { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        Self::Logging(e)
    }
}

impl From<ResolveError> for CliError {
    fn from(e: ResolveError) -> Self {
        Self::Resolve(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_display_messages() {
        let err = CliError::Resolve(ResolveError::UnknownCollection("hl3".to_string()));
        assert_eq!(err.to_string(), "unknown collection 'hl3'");

        let err = CliError::Output {
            path: Some(PathBuf::from("/tmp/out.bin")),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert_eq!(err.to_string(), "failed to write /tmp/out.bin: denied");
        assert!(err.source().is_some());

        assert!(CliError::Serve("bind failed".into()).source().is_none());
    }
}
