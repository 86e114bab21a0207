//! vpkserve - Serve content packed inside VPK archives
//!
//! This library indexes the VPK archives of one or more configured content
//! collections and resolves virtual file paths to their bytes. The CLI crate
//! wraps it in a small JSON-over-HTTP API.
//!
//! # Architecture
//!
//! ```text
//! config ──► CollectionRegistry ──► locator (walker) ──► index ──► resolver ──► api
//!                                        │                            │
//!                                        └──── archive::ArchiveCodec ─┘
//! ```
//!
//! The [`index::ContentIndex`] is built exactly once at startup and is
//! read-only afterwards, so it can be shared across request threads without
//! locking.

pub mod api;
pub mod archive;
pub mod collection;
pub mod config;
pub mod index;
pub mod logging;
pub mod resolver;
pub mod vpk;
pub mod walker;

/// Crate version, as reported by the CLI banner.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use archive::{ArchiveCodec, ArchiveKind, ArchiveLocation, VpkCodec};
pub use collection::{Collection, CollectionRegistry};
pub use index::{CollectionIndex, ContentIndex};
pub use resolver::{ContentResolver, ResolveError};
