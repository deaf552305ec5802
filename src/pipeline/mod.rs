//! Pipeline entry points.
//!
//! - `pivot`: Re-key a catalog by a resource attribute
//! - `run_pipeline`: Fetch the catalog, pivot it and publish the artifacts

pub mod pivot;
pub mod publish;

pub use pivot::{pivot, pivot_with_base};
pub use publish::{PipelineReport, publish_result, run_pipeline};
