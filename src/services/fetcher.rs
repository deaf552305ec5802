// src/services/fetcher.rs

//! Catalog fetcher service.
//!
//! Retrieves the catalog document. A body that is not valid JSON is handed
//! back as raw text rather than treated as an error.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Catalog, Config};
use crate::utils::http;

/// A fetched catalog body.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogBody {
    /// Body parsed as JSON
    Json(Value),
    /// Body that failed to parse, verbatim
    Text(String),
}

impl CatalogBody {
    /// Parse `text` as JSON, falling back to the raw text.
    pub fn parse(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Json(value),
            Err(e) => {
                log::warn!("Catalog body is not valid JSON ({}); keeping raw text", e);
                Self::Text(text)
            }
        }
    }

    /// Decompose the body into a catalog. Raw text yields an empty catalog.
    pub fn into_catalog(self) -> Result<Catalog> {
        match self {
            Self::Json(value) => Catalog::from_value(value),
            Self::Text(_) => Ok(Catalog::default()),
        }
    }
}

/// Anything that can produce the catalog document.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self) -> Result<CatalogBody>;

    /// Where the catalog comes from, for logs.
    fn describe(&self) -> String;
}

/// Fetches the catalog over HTTP.
pub struct HttpCatalogSource {
    client: Client,
    url: Url,
}

impl HttpCatalogSource {
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    /// Build a source for the configured origin.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = http::create_async_client(&config.source)?;
        Ok(Self::new(client, config.catalog_url()?))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    /// GET the catalog.
    ///
    /// Anything other than 200 is an error.
    async fn fetch(&self) -> Result<CatalogBody> {
        log::info!("Fetching catalog from {}", self.url);
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AppError::Status {
                url: self.url.to_string(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        log::debug!("Catalog body: {} bytes", text.len());
        Ok(CatalogBody::parse(text))
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// Reads the catalog from a local file.
pub struct FileCatalogSource {
    path: PathBuf,
}

impl FileCatalogSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CatalogSource for FileCatalogSource {
    async fn fetch(&self) -> Result<CatalogBody> {
        log::info!("Reading catalog from {}", self.path.display());
        let text = tokio::fs::read_to_string(&self.path).await?;
        Ok(CatalogBody::parse(text))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response and return the URL to request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        Url::parse(&format!("http://{addr}/v3/catalog.json")).unwrap()
    }

    fn source(url: Url) -> HttpCatalogSource {
        let config = Config::default();
        let client = http::create_async_client(&config.source).unwrap();
        HttpCatalogSource::new(client, url)
    }

    #[tokio::test]
    async fn test_fetch_json() {
        let url = serve_once("200 OK", r#"{"catalogs":[],"languages":[]}"#).await;
        let body = source(url).fetch().await.unwrap();
        assert_eq!(body, CatalogBody::Json(json!({ "catalogs": [], "languages": [] })));
    }

    #[tokio::test]
    async fn test_fetch_unparseable_body_returns_text() {
        let url = serve_once("200 OK", "OK").await;
        let body = source(url).fetch().await.unwrap();
        assert_eq!(body, CatalogBody::Text("OK".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_non_200_fails() {
        let url = serve_once("404 Not Found", "missing").await;
        let err = source(url.clone()).fetch().await.unwrap_err();
        match err {
            AppError::Status { url: failed, status } => {
                assert_eq!(status, 404);
                assert_eq!(failed, url.to_string());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_file_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"languages":[{"identifier":"en","resources":[]}]}"#).unwrap();

        let body = FileCatalogSource::new(&path).fetch().await.unwrap();
        let catalog = body.into_catalog().unwrap();
        assert_eq!(catalog.language_count(), 1);
    }

    #[test]
    fn test_text_body_is_empty_catalog() {
        let catalog = CatalogBody::Text("<html>".into()).into_catalog().unwrap();
        assert!(catalog.languages.is_none());
        assert!(catalog.catalogs.is_empty());
    }
}
