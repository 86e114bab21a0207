//! CLI command implementations.

pub mod collections;
pub mod concat;
pub mod config;
pub mod files;
pub mod get;
pub mod init;
pub mod serve;
