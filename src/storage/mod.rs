//! Source file storage
//!
//! This module handles reading the raw retail files:
//! - Object storage access (Azure Blob, local directory, in-memory)
//! - CSV and JSON parsing into datasets

mod blob;
mod format;

pub use blob::BlobStore;
pub use format::SourceFormat;
