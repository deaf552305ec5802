// src/models/mod.rs

//! Domain models for the catalog pivot application.

mod catalog;
mod config;
mod pivot;

// Re-export all public types
pub use catalog::{Catalog, Language};
pub use config::{Config, PublishConfig, SourceConfig};
pub use pivot::{PivotBuckets, PivotRecord, PivotResult, PivotedCatalog};

pub(crate) use config::defaults::INDEX_BASE_URL;
