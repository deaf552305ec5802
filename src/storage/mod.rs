//! Storage abstractions for published artifacts.
//!
//! ## Key Layout
//!
//! ```text
//! {bucket}/
//! └── v3/
//!     └── subjects/
//!         ├── index.json        # URLs of every per-subject document
//!         ├── pivoted.json      # Whole catalog re-keyed by subject
//!         ├── Bible.json        # Records for one subject
//!         └── Translation_Notes.json
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;

// Re-export for convenience
pub use local::LocalStorage;
#[cfg(feature = "s3")]
pub use s3::S3Storage;

/// Trait for artifact storage backends.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Store `body` under `key`, replacing any existing object.
    async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()>;

    /// Human-readable location of `key`, for logs.
    fn location(&self, key: &str) -> String;
}

/// Serializes values and hands them to a store.
#[derive(Clone)]
pub struct Publisher {
    store: Arc<dyn ArtifactStore>,
    content_type: String,
    pretty: bool,
}

impl Publisher {
    pub fn new(store: Arc<dyn ArtifactStore>, content_type: impl Into<String>) -> Self {
        Self {
            store,
            content_type: content_type.into(),
            pretty: false,
        }
    }

    /// Pretty-print every artifact.
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Serialize `data` as UTF-8 JSON and store it at `key`.
    pub async fn publish<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let body = if self.pretty {
            serde_json::to_vec_pretty(data)?
        } else {
            serde_json::to_vec(data)?
        };
        let size = body.len();

        self.store.put(key, body, &self.content_type).await?;
        log::info!("Published {} ({} bytes)", self.store.location(key), size);
        Ok(())
    }
}

/// Object key helpers.
pub mod paths {
    /// Directory holding every artifact for one pivot key.
    pub fn pivot_dir(prefix: &str, plural_key: &str) -> String {
        let prefix = prefix.trim_matches('/');
        if prefix.is_empty() {
            plural_key.to_string()
        } else {
            format!("{prefix}/{plural_key}")
        }
    }

    /// `{prefix}/{plural}/index.json`
    pub fn index_key(prefix: &str, plural_key: &str) -> String {
        format!("{}/index.json", pivot_dir(prefix, plural_key))
    }

    /// `{prefix}/{plural}/pivoted.json`
    pub fn pivoted_key(prefix: &str, plural_key: &str) -> String {
        format!("{}/pivoted.json", pivot_dir(prefix, plural_key))
    }

    /// `{prefix}/{plural}/{value}.json`
    pub fn value_key(prefix: &str, plural_key: &str, value: &str) -> String {
        format!("{}/{value}.json", pivot_dir(prefix, plural_key))
    }
}
