// src/lambda/mod.rs

//! AWS Lambda handler.
//!
//! Each invocation:
//! 1. Fetches `https://{API_ORIGIN}/v3/catalog.json`
//! 2. Pivots it on the configured key (`subject`)
//! 3. Writes `index.json`, `pivoted.json` and one document per subject to S3
//!
//! The handler always answers `"OK"`. Failures are reported through the
//! log only.

use std::sync::Arc;

use lambda_runtime::{Error as LambdaError, LambdaEvent};
use serde_json::Value;
use tracing::{error, info, instrument};

use crate::error::Result;
use crate::models::Config;
use crate::pipeline::{PipelineReport, run_pipeline};
use crate::services::{CatalogSource, HttpCatalogSource};
use crate::storage::{ArtifactStore, S3Storage};

/// Response body returned for every invocation.
pub const OK: &str = "OK";

/// Main Lambda handler function.
#[instrument(skip(event))]
pub async fn handler(event: LambdaEvent<Value>) -> std::result::Result<String, LambdaError> {
    let (payload, context) = event.into_parts();
    info!(request_id = %context.request_id, "Handling event: {:?}", payload);

    let config = Config::from_env();
    let outcome = match build_collaborators(&config).await {
        Ok((source, store)) => run_pipeline(&config, source.as_ref(), store).await,
        Err(e) => Err(e),
    };

    Ok(report(outcome))
}

/// Run the pipeline with explicit collaborators and map the outcome to the
/// handler response.
pub async fn handle_with(
    config: &Config,
    source: &dyn CatalogSource,
    store: Arc<dyn ArtifactStore>,
) -> String {
    report(run_pipeline(config, source, store).await)
}

async fn build_collaborators(
    config: &Config,
) -> Result<(Box<dyn CatalogSource>, Arc<dyn ArtifactStore>)> {
    config.validate()?;
    let source = HttpCatalogSource::from_config(config)?;
    let store = S3Storage::from_config(config).await;
    info!("Publishing to bucket {}", store.bucket());
    Ok((Box::new(source), Arc::new(store)))
}

/// Log the outcome; the response is `"OK"` either way.
fn report(outcome: Result<PipelineReport>) -> String {
    match outcome {
        Ok(report) => {
            info!(
                pivot_key = %report.pivot_key,
                records = report.record_count,
                values = report.value_count,
                artifacts = report.artifacts_written,
                elapsed_ms = report.elapsed_ms(),
                "Catalog pivot completed"
            );
        }
        Err(e) => {
            error!("Catalog pivot failed: {}", e);
        }
    }
    OK.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::error::AppError;
    use crate::services::CatalogBody;
    use crate::storage::LocalStorage;

    struct Unreachable;

    #[async_trait]
    impl CatalogSource for Unreachable {
        async fn fetch(&self) -> Result<CatalogBody> {
            Err(AppError::Status {
                url: "https://api.door43.org/v3/catalog.json".into(),
                status: 500,
            })
        }

        fn describe(&self) -> String {
            "unreachable".into()
        }
    }

    struct Fixed(serde_json::Value);

    #[async_trait]
    impl CatalogSource for Fixed {
        async fn fetch(&self) -> Result<CatalogBody> {
            Ok(CatalogBody::Json(self.0.clone()))
        }

        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    #[tokio::test]
    async fn test_success_answers_ok() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(LocalStorage::new(tmp.path()));
        let source = Fixed(json!({
            "languages": [{ "identifier": "en", "resources": [{ "subject": "Bible" }] }]
        }));

        let response = handle_with(&Config::default(), &source, store).await;

        assert_eq!(response, "OK");
        assert!(tmp.path().join("v3/subjects/Bible.json").exists());
    }

    #[tokio::test]
    async fn test_failure_still_answers_ok() {
        let tmp = TempDir::new().unwrap();
        let store = Arc::new(LocalStorage::new(tmp.path()));

        let response = handle_with(&Config::default(), &Unreachable, store).await;

        assert_eq!(response, "OK");
        assert!(!tmp.path().join("v3/subjects/index.json").exists());
    }
}
