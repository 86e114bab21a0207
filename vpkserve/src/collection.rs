//! Configured content collections.
//!
//! A collection is one logical grouping of content (typically one game),
//! scanned from one or more search roots. The registry is built once from
//! configuration and never modified afterwards.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

/// Errors raised while assembling the registry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two collections share an alias.
    #[error("duplicate collection alias '{0}'")]
    DuplicateAlias(String),

    /// A collection has an empty alias.
    #[error("collection alias must not be empty")]
    EmptyAlias,
}

/// A configured content collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collection {
    alias: String,
    display_name: String,
    search_roots: Vec<PathBuf>,
    app_id: Option<u32>,
    single_file_archives: bool,
}

impl Collection {
    /// Create a collection with no search roots.
    pub fn new(alias: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            alias: alias.into(),
            display_name: display_name.into(),
            search_roots: Vec::new(),
            app_id: None,
            single_file_archives: false,
        }
    }

    /// Add a search root. Roots are scanned in the order they are added.
    pub fn with_search_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.search_roots.push(root.into());
        self
    }

    /// Set the Steam application id.
    pub fn with_app_id(mut self, app_id: u32) -> Self {
        self.app_id = Some(app_id);
        self
    }

    /// Also index standalone `.vpk` files that are not multi-part directories.
    pub fn with_single_file_archives(mut self, enabled: bool) -> Self {
        self.single_file_archives = enabled;
        self
    }

    /// Unique key of the collection.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Search roots in scan order.
    pub fn search_roots(&self) -> &[PathBuf] {
        &self.search_roots
    }

    /// Steam application id, if configured.
    pub fn app_id(&self) -> Option<u32> {
        self.app_id
    }

    /// Whether standalone single-file archives are indexed.
    pub fn single_file_archives(&self) -> bool {
        self.single_file_archives
    }

    /// Summary for listings.
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary {
            alias: self.alias.clone(),
            display_name: self.display_name.clone(),
        }
    }
}

/// Alias and display name of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CollectionSummary {
    pub alias: String,
    pub display_name: String,
}

/// Ordered set of collections with unique aliases.
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    collections: Vec<Collection>,
}

impl CollectionRegistry {
    /// Build a registry, rejecting empty or duplicate aliases.
    pub fn new(collections: Vec<Collection>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for collection in &collections {
            if collection.alias.is_empty() {
                return Err(RegistryError::EmptyAlias);
            }
            if !seen.insert(collection.alias.as_str()) {
                return Err(RegistryError::DuplicateAlias(collection.alias.clone()));
            }
        }
        Ok(Self { collections })
    }

    /// Look up a collection by alias.
    pub fn get(&self, alias: &str) -> Option<&Collection> {
        self.collections.iter().find(|c| c.alias == alias)
    }

    /// All collections in configured order.
    pub fn iter(&self) -> impl Iterator<Item = &Collection> {
        self.collections.iter()
    }

    /// All collections as a slice, in configured order.
    pub fn as_slice(&self) -> &[Collection] {
        &self.collections
    }

    /// Alias and display name of every collection, in configured order.
    pub fn summaries(&self) -> Vec<CollectionSummary> {
        self.collections.iter().map(Collection::summary).collect()
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Check if no collections are configured.
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }
}

/// Join a collection's base directory with each of its search paths.
pub fn search_roots(
    content_root: &Path,
    collection_path: &str,
    search_paths: &[String],
) -> Vec<PathBuf> {
    let base = content_root.join(collection_path);
    search_paths.iter().map(|p| base.join(p)).collect()
}
