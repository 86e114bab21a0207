//! INI configuration.
//!
//! The configuration file lives at `~/.vpkserve/config.ini` unless a path
//! is given explicitly:
//!
//! ```ini
//! [server]
//! listen = 127.0.0.1:8080
//! content_root = content
//!
//! [logging]
//! directory = ~/.vpkserve/logs
//! level = info
//!
//! [collection.tf2]
//! name = Team Fortress 2
//! path = tf2
//! search_paths = tf, hl2
//! app_id = 440
//! ```
//!
//! Collections keep the order of their sections. A relative `content_root`
//! is resolved against the directory holding the config file.

use std::fs;
use std::io;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ini::{Ini, Properties};
use thiserror::Error;
use tracing::warn;

use crate::collection::{self, Collection, CollectionRegistry, RegistryError};

/// Directory under the home directory holding vpkserve state.
const APP_DIR: &str = ".vpkserve";

/// Name of the configuration file.
const CONFIG_FILE_NAME: &str = "config.ini";

/// Prefix of per-collection section names.
const COLLECTION_PREFIX: &str = "collection.";

/// Default listen address.
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";

/// Default content root, relative to the config file.
pub const DEFAULT_CONTENT_ROOT: &str = "content";

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config syntax: {0}")]
    Parse(String),

    #[error("invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("missing required key [{section}] {key}")]
    MissingKey { section: String, key: String },

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// `[server]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub listen: SocketAddr,
    /// Absolute (or config-relative, before resolution) content root.
    pub content_root: PathBuf,
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Directory for the log file. File logging is off when unset.
    pub directory: Option<PathBuf>,
    /// Level used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// One `[collection.<alias>]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    pub alias: String,
    pub name: String,
    /// Directory of the collection under the content root.
    pub path: String,
    /// Search paths under `path`, in scan order.
    pub search_paths: Vec<String>,
    pub app_id: Option<u32>,
    pub single_file_archives: bool,
}

/// Parsed configuration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub collections: Vec<CollectionConfig>,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                listen: SocketAddr::from(([127, 0, 0, 1], 8080)),
                content_root: PathBuf::from(DEFAULT_CONTENT_ROOT),
            },
            logging: LoggingConfig::default(),
            collections: Vec::new(),
        }
    }
}

/// Default configuration file path (`~/.vpkserve/config.ini`).
pub fn config_file_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(CONFIG_FILE_NAME)
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&text, base_dir)
    }

    /// Parse INI text. Relative paths resolve against `base_dir`.
    pub fn parse(text: &str, base_dir: &Path) -> ConfigResult<Self> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        let mut config = ConfigFile::default();

        for (section, props) in ini.iter() {
            match section {
                None => {
                    if props.iter().next().is_some() {
                        warn!("Ignoring keys outside of any section");
                    }
                }
                Some("server") => parse_server(props, &mut config.server)?,
                Some("logging") => parse_logging(props, &mut config.logging)?,
                Some(name) => match name.strip_prefix(COLLECTION_PREFIX) {
                    Some(alias) => config.collections.push(parse_collection(name, alias, props)?),
                    None => warn!(section = name, "Ignoring unknown config section"),
                },
            }
        }

        if config.server.content_root.is_relative() {
            config.server.content_root = base_dir.join(&config.server.content_root);
        }

        Ok(config)
    }

    /// Build the collection registry described by this configuration.
    pub fn registry(&self) -> ConfigResult<CollectionRegistry> {
        let collections = self
            .collections
            .iter()
            .map(|c| {
                let roots = collection::search_roots(
                    &self.server.content_root,
                    &c.path,
                    &c.search_paths,
                );
                let mut entry = Collection::new(&c.alias, &c.name)
                    .with_single_file_archives(c.single_file_archives);
                for root in roots {
                    entry = entry.with_search_root(root);
                }
                if let Some(app_id) = c.app_id {
                    entry = entry.with_app_id(app_id);
                }
                entry
            })
            .collect();
        Ok(CollectionRegistry::new(collections)?)
    }

    /// Starter configuration written by `vpkserve init`.
    pub fn default_template() -> String {
        format!(
            "\
; vpkserve configuration

[server]
; Address the HTTP API listens on.
listen = {listen}
; Directory holding one subdirectory per collection.
; Relative paths are resolved against this file's directory.
content_root = {root}

[logging]
; Log file directory. Leave empty to log to stderr only.
directory =
; Level used when RUST_LOG is not set (trace, debug, info, warn, error).
level = {level}

; One section per collection. Search paths are scanned in order; when the
; same file appears in several archives, the first one found wins.
;
; [collection.tf2]
; name = Team Fortress 2
; path = tf2
; search_paths = tf, hl2
; app_id = 440
; single_file_archives = false
",
            listen = DEFAULT_LISTEN,
            root = DEFAULT_CONTENT_ROOT,
            level = DEFAULT_LOG_LEVEL,
        )
    }

    /// Write the starter configuration to `path`, creating parent
    /// directories as needed.
    pub fn save_template(path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        fs::write(path, Self::default_template()).map_err(write_err)
    }
}

fn parse_server(props: &Properties, server: &mut ServerConfig) -> ConfigResult<()> {
    if let Some(listen) = props.get("listen") {
        server.listen = listen.parse().map_err(|e: std::net::AddrParseError| {
            invalid("server", "listen", listen, e.to_string())
        })?;
    }
    if let Some(root) = non_empty(props.get("content_root")) {
        server.content_root = expand_home(root);
    }
    Ok(())
}

fn parse_logging(props: &Properties, logging: &mut LoggingConfig) -> ConfigResult<()> {
    logging.directory = non_empty(props.get("directory")).map(expand_home);
    if let Some(level) = non_empty(props.get("level")) {
        let level = level.to_lowercase();
        if !matches!(level.as_str(), "trace" | "debug" | "info" | "warn" | "error") {
            return Err(invalid(
                "logging",
                "level",
                &level,
                "expected trace, debug, info, warn or error".to_string(),
            ));
        }
        logging.level = level;
    }
    Ok(())
}

fn parse_collection(section: &str, alias: &str, props: &Properties) -> ConfigResult<CollectionConfig> {
    if alias.is_empty() {
        return Err(RegistryError::EmptyAlias.into());
    }
    let required = |key: &str| {
        non_empty(props.get(key))
            .map(str::to_string)
            .ok_or_else(|| ConfigError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    };

    let name = required("name")?;
    let path = required("path")?;
    let search_paths: Vec<String> = required("search_paths")?
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let app_id = non_empty(props.get("app_id"))
        .map(|v| {
            v.parse::<u32>()
                .map_err(|e| invalid(section, "app_id", v, e.to_string()))
        })
        .transpose()?;

    let single_file_archives = match non_empty(props.get("single_file_archives")) {
        None => false,
        Some(v) => parse_bool(v).ok_or_else(|| {
            invalid(section, "single_file_archives", v, "expected true or false".to_string())
        })?,
    };

    Ok(CollectionConfig {
        alias: alias.to_string(),
        name,
        path,
        search_paths,
        app_id,
        single_file_archives,
    })
}

fn invalid(section: &str, key: &str, value: &str, reason: String) -> ConfigError {
    ConfigError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason,
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" => Some(true),
        "false" | "no" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Expand a leading `~` to the home directory.
fn expand_home(value: &str) -> PathBuf {
    match value.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => dirs::home_dir()
            .map(|home| home.join(rest.trim_start_matches('/')))
            .unwrap_or_else(|| PathBuf::from(value)),
        _ => PathBuf::from(value),
    }
}
