//! Catalog pivot CLI
//!
//! Local execution entry point. For AWS Lambda, use `catalog-pivot-lambda`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use catalog_pivot::{
    error::Result,
    models::Config,
    pipeline,
    services::{CatalogSource, FileCatalogSource, HttpCatalogSource},
    storage::{ArtifactStore, LocalStorage, Publisher},
};
use clap::{Parser, Subcommand};

/// catalog-pivot - Door43 catalog re-indexer
#[derive(Parser, Debug)]
#[command(
    name = "catalog-pivot",
    version,
    about = "Re-index the Door43 catalog by a resource attribute"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "catalog-pivot.toml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch, pivot and publish the catalog
    Run {
        /// Read the catalog from a file instead of the API
        #[arg(long)]
        input: Option<PathBuf>,

        /// Write artifacts under this directory (ignored with --s3)
        #[arg(short, long, default_value = "output")]
        out: PathBuf,

        /// Write artifacts to the configured S3 bucket
        #[arg(long)]
        s3: bool,
    },

    /// Pivot a local catalog file and write the artifacts locally
    Pivot {
        /// Catalog JSON file
        #[arg(short, long)]
        input: PathBuf,

        /// Resource attribute to pivot on (default: from config)
        #[arg(short, long)]
        key: Option<String>,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        out: PathBuf,
    },

    /// Validate the configuration
    Validate,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        log::debug!("No config at {}, using defaults", cli.config.display());
        Config::default()
    };
    config.apply_env();

    match cli.command {
        Command::Run { input, out, s3 } => {
            config.validate()?;

            let source: Box<dyn CatalogSource> = match input {
                Some(path) => Box::new(FileCatalogSource::new(path)),
                None => Box::new(HttpCatalogSource::from_config(&config)?),
            };
            let store = open_store(&config, &out, s3).await?;

            let report = pipeline::run_pipeline(&config, source.as_ref(), store).await?;
            log::info!(
                "Published {} artifacts for {} {} values in {}ms",
                report.artifacts_written,
                report.value_count,
                report.pivot_key,
                report.elapsed_ms()
            );
        }

        Command::Pivot { input, key, out } => {
            if let Some(key) = key {
                config.publish.pivot_key = key;
            }
            config.validate()?;

            let catalog = FileCatalogSource::new(&input)
                .fetch()
                .await?
                .into_catalog()?;
            let result = pipeline::pivot_with_base(
                &catalog,
                &config.publish.pivot_key,
                &config.publish.index_base_url,
            );

            let store = Arc::new(LocalStorage::new(&out));
            let publisher = Publisher::new(store, config.publish.content_type.clone())
                .pretty(config.publish.pretty);
            let written = pipeline::publish_result(
                &publisher,
                &config.publish.prefix,
                &result,
                config.publish.max_concurrent,
            )
            .await?;

            log::info!(
                "Wrote {} artifacts ({} records) to {}",
                written,
                result.pivoted.records.len(),
                out.display()
            );
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Catalog: {}", config.catalog_url()?);
            log::info!("✓ Bucket: {}", config.bucket());
            log::info!("✓ Pivot key: {}", config.publish.pivot_key);
        }
    }

    log::info!("Done!");

    Ok(())
}

#[cfg(feature = "s3")]
async fn open_store(config: &Config, out: &Path, s3: bool) -> Result<Arc<dyn ArtifactStore>> {
    if s3 {
        let store = catalog_pivot::storage::S3Storage::from_config(config).await;
        log::info!("Publishing to s3://{}", store.bucket());
        return Ok(Arc::new(store));
    }
    Ok(Arc::new(LocalStorage::new(out)))
}

#[cfg(not(feature = "s3"))]
async fn open_store(_config: &Config, out: &Path, s3: bool) -> Result<Arc<dyn ArtifactStore>> {
    if s3 {
        return Err(catalog_pivot::error::AppError::config(
            "S3 output requires building with the 's3' feature",
        ));
    }
    Ok(Arc::new(LocalStorage::new(out)))
}
