//! Service layer for the catalog pivot application.
//!
//! - Catalog retrieval (`CatalogSource`, `HttpCatalogSource`, `FileCatalogSource`)

mod fetcher;

pub use fetcher::{CatalogBody, CatalogSource, FileCatalogSource, HttpCatalogSource};
