// src/pipeline/publish.rs

//! Fetch → pivot → publish.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{Config, PivotResult};
use crate::services::CatalogSource;
use crate::storage::{ArtifactStore, Publisher, paths};

use super::pivot::pivot_with_base;

/// Summary of one pipeline run.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineReport {
    pub pivot_key: String,
    pub language_count: usize,
    pub record_count: usize,
    pub value_count: usize,
    /// Objects written, including index and pivoted
    pub artifacts_written: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Run the full pipeline against `source` and `store`.
///
/// The index and pivoted catalog are written first, in that order. The
/// per-value documents are then written concurrently and awaited as one
/// batch; every failure in the batch is collected into a single
/// [`AppError::Publish`].
pub async fn run_pipeline(
    config: &Config,
    source: &dyn CatalogSource,
    store: Arc<dyn ArtifactStore>,
) -> Result<PipelineReport> {
    let started_at = Utc::now();
    let key = config.publish.pivot_key.as_str();

    let catalog = source.fetch().await?.into_catalog()?;
    log::info!(
        "Catalog from {} has {} languages with {} resources",
        source.describe(),
        catalog.language_count(),
        catalog.resource_count()
    );

    let result = pivot_with_base(&catalog, key, &config.publish.index_base_url);
    log::info!(
        "Pivoted on '{}': {} records across {} values",
        key,
        result.pivoted.records.len(),
        result.buckets.len()
    );

    let publisher =
        Publisher::new(store, config.publish.content_type.clone()).pretty(config.publish.pretty);
    let written = publish_result(
        &publisher,
        &config.publish.prefix,
        &result,
        config.publish.max_concurrent,
    )
    .await?;

    Ok(PipelineReport {
        pivot_key: key.to_string(),
        language_count: catalog.language_count(),
        record_count: result.pivoted.records.len(),
        value_count: result.buckets.len(),
        artifacts_written: written,
        started_at,
        finished_at: Utc::now(),
    })
}

/// Write every artifact derived from `result`. Returns the object count.
pub async fn publish_result(
    publisher: &Publisher,
    prefix: &str,
    result: &PivotResult,
    max_concurrent: usize,
) -> Result<usize> {
    let plural_key = result.plural_key();

    publisher
        .publish(&paths::index_key(prefix, plural_key), &result.index)
        .await?;
    publisher
        .publish(&paths::pivoted_key(prefix, plural_key), &result.pivoted)
        .await?;

    let total = result.buckets.len();
    let failures: Vec<(String, AppError)> = stream::iter(result.buckets.iter())
        .map(|(value, records)| async move {
            let key = paths::value_key(prefix, plural_key, value);
            let outcome = publisher.publish(&key, records).await;
            (key, outcome)
        })
        .buffer_unordered(max_concurrent.max(1))
        .filter_map(|(key, outcome)| async move { outcome.err().map(|e| (key, e)) })
        .collect()
        .await;

    if !failures.is_empty() {
        for (key, err) in &failures {
            log::error!("Failed to publish {}: {}", key, err);
        }
        return Err(AppError::publish(total, &failures));
    }

    Ok(total + 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use crate::services::CatalogBody;
    use crate::storage::LocalStorage;

    struct StaticSource(CatalogBody);

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn fetch(&self) -> Result<CatalogBody> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".into()
        }
    }

    struct FailingSource;

    #[async_trait]
    impl CatalogSource for FailingSource {
        async fn fetch(&self) -> Result<CatalogBody> {
            Err(AppError::Status {
                url: "https://api.door43.org/v3/catalog.json".into(),
                status: 503,
            })
        }

        fn describe(&self) -> String {
            "failing".into()
        }
    }

    /// Records every write; fails keys listed in `reject`.
    #[derive(Default)]
    struct RecordingStore {
        writes: Mutex<Vec<(String, Vec<u8>, String)>>,
        reject: HashSet<String>,
    }

    #[async_trait]
    impl ArtifactStore for RecordingStore {
        async fn put(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<()> {
            if self.reject.contains(key) {
                return Err(AppError::storage(key, "access denied"));
            }
            self.writes
                .lock()
                .unwrap()
                .push((key.to_string(), body, content_type.to_string()));
            Ok(())
        }

        fn location(&self, key: &str) -> String {
            format!("mem://{key}")
        }
    }

    impl RecordingStore {
        fn keys(&self) -> Vec<String> {
            self.writes.lock().unwrap().iter().map(|w| w.0.clone()).collect()
        }

        fn json(&self, key: &str) -> Value {
            let writes = self.writes.lock().unwrap();
            let (_, body, _) = writes.iter().find(|w| w.0 == key).unwrap();
            serde_json::from_slice(body).unwrap()
        }
    }

    fn shared_subject_catalog() -> CatalogBody {
        CatalogBody::Json(json!({
            "catalogs": [{ "identifier": "langnames" }],
            "languages": [
                {
                    "identifier": "en",
                    "direction": "ltr",
                    "title": "English",
                    "resources": [{ "subject": "Open Bible Stories", "identifier": "obs" }]
                },
                {
                    "identifier": "ur-deva",
                    "direction": "ltr",
                    "title": "Urdu",
                    "resources": [{ "subject": "Open Bible Stories", "identifier": "obs" }]
                }
            ]
        }))
    }

    #[tokio::test]
    async fn test_shared_subject_is_written_once() {
        let store = Arc::new(RecordingStore::default());
        let source = StaticSource(shared_subject_catalog());

        let report = run_pipeline(&Config::default(), &source, store.clone())
            .await
            .unwrap();

        assert_eq!(report.value_count, 1);
        assert_eq!(report.record_count, 2);
        assert_eq!(report.artifacts_written, 3);

        let keys = store.keys();
        assert_eq!(
            keys,
            vec![
                "v3/subjects/index.json",
                "v3/subjects/pivoted.json",
                "v3/subjects/Open_Bible_Stories.json",
            ]
        );

        let records = store.json("v3/subjects/Open_Bible_Stories.json");
        let languages: Vec<&str> = records
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["language"].as_str().unwrap())
            .collect();
        assert_eq!(languages, vec!["en", "ur-deva"]);

        assert_eq!(
            store.json("v3/subjects/index.json"),
            json!(["https://api.door43.org/v3/subjects/Open_Bible_Stories.json"])
        );
        assert_eq!(
            store.json("v3/subjects/pivoted.json")["catalogs"],
            json!([{ "identifier": "langnames" }])
        );
    }

    #[tokio::test]
    async fn test_content_type_is_configured_value() {
        let store = Arc::new(RecordingStore::default());
        let source = StaticSource(shared_subject_catalog());

        run_pipeline(&Config::default(), &source, store.clone())
            .await
            .unwrap();

        let writes = store.writes.lock().unwrap();
        assert!(writes.iter().all(|w| w.2 == "text/html; charset=utf-8"));
    }

    #[tokio::test]
    async fn test_fetch_failure_publishes_nothing() {
        let store = Arc::new(RecordingStore::default());

        let err = run_pipeline(&Config::default(), &FailingSource, store.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Status { status: 503, .. }));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_fan_out_failures_are_aggregated() {
        let source = StaticSource(CatalogBody::Json(json!({
            "languages": [{
                "identifier": "en",
                "resources": [
                    { "subject": "Bible" },
                    { "subject": "Translation Notes" },
                    { "subject": "Translation Words" }
                ]
            }]
        })));
        let store = Arc::new(RecordingStore {
            reject: ["v3/subjects/Bible.json", "v3/subjects/Translation_Words.json"]
                .into_iter()
                .map(String::from)
                .collect(),
            ..Default::default()
        });

        let err = run_pipeline(&Config::default(), &source, store.clone())
            .await
            .unwrap_err();

        match err {
            AppError::Publish { failed, total, .. } => {
                assert_eq!(failed, 2);
                assert_eq!(total, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        // the batch still ran to completion
        assert!(store
            .keys()
            .contains(&"v3/subjects/Translation_Notes.json".to_string()));
    }

    #[tokio::test]
    async fn test_index_failure_stops_before_fan_out() {
        let store = Arc::new(RecordingStore {
            reject: ["v3/subjects/index.json".to_string()].into_iter().collect(),
            ..Default::default()
        });
        let source = StaticSource(shared_subject_catalog());

        let err = run_pipeline(&Config::default(), &source, store.clone())
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Storage { .. }));
        assert!(store.keys().is_empty());
    }

    #[tokio::test]
    async fn test_unparseable_catalog_publishes_empty_artifacts() {
        let store = Arc::new(RecordingStore::default());
        let source = StaticSource(CatalogBody::Text("<html>maintenance</html>".into()));

        let report = run_pipeline(&Config::default(), &source, store.clone())
            .await
            .unwrap();

        assert_eq!(report.value_count, 0);
        assert_eq!(store.json("v3/subjects/index.json"), json!([]));
        assert_eq!(
            store.json("v3/subjects/pivoted.json"),
            json!({ "catalogs": [], "subjects": [] })
        );
    }

    #[tokio::test]
    async fn test_local_storage_layout() {
        let tmp = TempDir::new().unwrap();
        let storage = Arc::new(LocalStorage::new(tmp.path()));
        let mut config = Config::default();
        config.publish.pivot_key = "format".into();

        let source = StaticSource(CatalogBody::Json(json!({
            "languages": [{
                "identifier": "en",
                "resources": [{ "format": "text/usfm" }, { "format": "pdf" }]
            }]
        })));

        run_pipeline(&config, &source, storage.clone()).await.unwrap();

        assert!(tmp.path().join("v3/formats/index.json").exists());
        assert!(tmp.path().join("v3/formats/pivoted.json").exists());
        assert!(tmp.path().join("v3/formats/pdf.json").exists());
        assert!(tmp.path().join("v3/formats/text/usfm.json").exists());
    }
}
