//! AWS Lambda entry point for the catalog pivot.
//!
//! Deploy with `cargo lambda build --release --features lambda`.
//!
//! ## Environment Variables
//!
//! - `API_ORIGIN`: Catalog host and default bucket (default: `api.door43.org`)
//! - `S3_BUCKET`: Bucket override
//! - `PIVOT_KEY`: Resource attribute to pivot on (default: `subject`)
//! - `FETCH_TIMEOUT_SECS`: HTTP request timeout
//! - `MAX_CONCURRENT`: Maximum concurrent uploads
//! - `CONFIG_PATH`: Optional TOML config bundled with the function
//! - `RUST_LOG`: Log level (e.g., `info`, `debug`)

use lambda_runtime::{Error as LambdaError, service_fn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use catalog_pivot::lambda;

/// Main entry point for the AWS Lambda function.
#[tokio::main]
async fn main() -> Result<(), LambdaError> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    tracing::info!("Catalog pivot Lambda starting...");
    lambda_runtime::run(service_fn(lambda::handler)).await
}
