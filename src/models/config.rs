//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Where the catalog is fetched from
    #[serde(default)]
    pub source: SourceConfig,

    /// Where and how artifacts are written
    #[serde(default)]
    pub publish: PublishConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Build the configuration used inside Lambda.
    ///
    /// Defaults, then `CONFIG_PATH` if it points at a file, then the
    /// environment overrides.
    pub fn from_env() -> Self {
        Self::from_env_with(|name| std::env::var(name).ok())
    }

    /// [`Config::from_env`] over an arbitrary variable lookup.
    pub fn from_env_with<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match lookup("CONFIG_PATH") {
            Some(path) if Path::new(&path).exists() => Self::load_or_default(&path),
            _ => Self::default(),
        };
        config.apply_env_from(lookup);
        config
    }

    /// Apply overrides from process environment variables.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origin) = lookup("API_ORIGIN").filter(|s| !s.trim().is_empty()) {
            self.source.api_origin = origin.trim().to_string();
        }

        if let Some(bucket) = lookup("S3_BUCKET").filter(|s| !s.trim().is_empty()) {
            self.publish.bucket = Some(bucket.trim().to_string());
        }

        if let Some(key) = lookup("PIVOT_KEY").filter(|s| !s.trim().is_empty()) {
            self.publish.pivot_key = key.trim().to_string();
        }

        if let Some(secs) = lookup("FETCH_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.source.timeout_secs = secs;
        }

        if let Some(n) = lookup("MAX_CONCURRENT").and_then(|s| s.parse().ok()) {
            self.publish.max_concurrent = n;
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.api_origin.trim().is_empty() {
            return Err(AppError::validation("source.api_origin is empty"));
        }
        if !self.source.catalog_path.starts_with('/') {
            return Err(AppError::validation(
                "source.catalog_path must start with '/'",
            ));
        }
        if self.source.user_agent.trim().is_empty() {
            return Err(AppError::validation("source.user_agent is empty"));
        }
        if self.source.timeout_secs == 0 {
            return Err(AppError::validation("source.timeout_secs must be > 0"));
        }
        if self.publish.pivot_key.trim().is_empty() {
            return Err(AppError::validation("publish.pivot_key is empty"));
        }
        if self.publish.max_concurrent == 0 {
            return Err(AppError::validation("publish.max_concurrent must be > 0"));
        }
        if self.bucket().trim().is_empty() {
            return Err(AppError::validation("publish.bucket is empty"));
        }
        self.catalog_url()?;
        Url::parse(&self.publish.index_base_url)?;
        Ok(())
    }

    /// Full URL of the catalog document.
    pub fn catalog_url(&self) -> Result<Url> {
        let url = Url::parse(&format!(
            "https://{}{}",
            self.source.api_origin, self.source.catalog_path
        ))?;
        Ok(url)
    }

    /// Target bucket: explicit setting, otherwise the API origin.
    pub fn bucket(&self) -> &str {
        self.publish
            .bucket
            .as_deref()
            .unwrap_or(&self.source.api_origin)
    }
}

/// Catalog origin and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Host serving the catalog; also the default bucket name
    #[serde(default = "defaults::api_origin")]
    pub api_origin: String,

    /// Path of the catalog document on the origin
    #[serde(default = "defaults::catalog_path")]
    pub catalog_path: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            api_origin: defaults::api_origin(),
            catalog_path: defaults::catalog_path(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Artifact publishing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Bucket name; falls back to `source.api_origin`
    #[serde(default)]
    pub bucket: Option<String>,

    /// Key prefix for every artifact
    #[serde(default = "defaults::prefix")]
    pub prefix: String,

    /// Resource attribute to pivot on
    #[serde(default = "defaults::pivot_key")]
    pub pivot_key: String,

    /// Base of the URLs written to the index
    #[serde(default = "defaults::index_base_url")]
    pub index_base_url: String,

    /// Content-Type stored with each object
    #[serde(default = "defaults::content_type")]
    pub content_type: String,

    /// Maximum concurrent per-value uploads
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Pretty-print artifacts
    #[serde(default)]
    pub pretty: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: defaults::prefix(),
            pivot_key: defaults::pivot_key(),
            index_base_url: defaults::index_base_url(),
            content_type: defaults::content_type(),
            max_concurrent: defaults::max_concurrent(),
            pretty: false,
        }
    }
}

pub(crate) mod defaults {
    pub const INDEX_BASE_URL: &str = "https://api.door43.org/v3";

    // Source defaults
    pub fn api_origin() -> String {
        "api.door43.org".into()
    }
    pub fn catalog_path() -> String {
        "/v3/catalog.json".into()
    }
    pub fn user_agent() -> String {
        concat!("catalog-pivot/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }

    // Publish defaults
    pub fn prefix() -> String {
        "v3".into()
    }
    pub fn pivot_key() -> String {
        "subject".into()
    }
    pub fn index_base_url() -> String {
        INDEX_BASE_URL.into()
    }
    pub fn content_type() -> String {
        "text/html; charset=utf-8".into()
    }
    pub fn max_concurrent() -> usize {
        8
    }
}
