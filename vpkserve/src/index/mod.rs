//! Virtual file indexing.
//!
//! Builds, once at startup, the read-only map from each collection's virtual
//! paths to the archive that owns them.
//!
//! ```text
//! CollectionRegistry
//!   └─ Collection ──scan_collection──► [ArchiveLocation] (walk order)
//!                                            │
//!                          ArchiveCodec::open + entries (rayon)
//!                                            │
//!                                            ▼
//!                          CollectionIndex (first archive wins)
//!                                            │
//!                                            ▼
//!                 ContentIndex { alias → CollectionIndex }
//! ```
//!
//! Collections are indexed in parallel. Within a collection, archives are
//! listed in parallel but merged strictly in scan order.

mod locator;
mod path;
mod union;

pub use locator::scan_collection;
pub use path::normalize_virtual_path;
pub use union::{CollectionIndex, ScanError, VirtualFileEntry};

use std::collections::HashMap;
use std::time::Instant;

use rayon::prelude::*;
use tracing::info;

use crate::archive::ArchiveCodec;
use crate::collection::CollectionRegistry;

/// Indexes of every configured collection.
///
/// Built once before serving begins and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContentIndex {
    registry: CollectionRegistry,
    collections: HashMap<String, CollectionIndex>,
}

impl ContentIndex {
    /// Scan and index every collection in the registry.
    pub fn build(registry: CollectionRegistry, codec: &dyn ArchiveCodec) -> Self {
        let collections = registry
            .as_slice()
            .par_iter()
            .map(|collection| {
                let start = Instant::now();
                let archives = scan_collection(collection);
                let index = CollectionIndex::build(collection.alias(), &archives, codec);
                info!(
                    collection = collection.alias(),
                    archives = index.archives().len(),
                    skipped = index.skipped().len(),
                    files = index.file_count(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Collection indexed"
                );
                (collection.alias().to_string(), index)
            })
            .collect();

        Self {
            registry,
            collections,
        }
    }

    /// Assemble from already-built collection indexes.
    ///
    /// Collections in the registry without an index get an empty one.
    pub fn from_parts(registry: CollectionRegistry, indexes: Vec<CollectionIndex>) -> Self {
        let mut collections: HashMap<String, CollectionIndex> = indexes
            .into_iter()
            .map(|index| (index.alias().to_string(), index))
            .collect();
        for collection in registry.iter() {
            collections
                .entry(collection.alias().to_string())
                .or_insert_with(|| CollectionIndex::new(collection.alias()));
        }
        Self {
            registry,
            collections,
        }
    }

    /// The registry this index was built from.
    pub fn registry(&self) -> &CollectionRegistry {
        &self.registry
    }

    /// Index of one collection. `None` when the alias is not configured.
    pub fn collection(&self, alias: &str) -> Option<&CollectionIndex> {
        self.registry.get(alias)?;
        self.collections.get(alias)
    }

    /// Total number of indexed files across all collections.
    pub fn file_count(&self) -> usize {
        self.registry
            .iter()
            .filter_map(|c| self.collections.get(c.alias()))
            .map(CollectionIndex::file_count)
            .sum()
    }
}
