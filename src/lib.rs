//! Retail Star ETL
//!
//! A batch pipeline that pulls retail transactions, a product catalog and a
//! customer master out of blob storage, shapes them into a star schema and
//! replaces the warehouse tables with the result.

pub mod config;
pub mod error;
pub mod etl;
pub mod model;
pub mod storage;
pub mod transform;
pub mod warehouse;

// Re-exports for convenience
pub use config::PipelineConfig;
pub use error::{EtlError, Result};
pub use etl::{Extractor, Loader, Pipeline, RunReport, SourcePaths, Transformer};
pub use model::{Dataset, StarSchema};
pub use storage::BlobStore;
pub use transform::StarSchemaTransformer;
pub use warehouse::{MemoryWarehouse, MsSqlWarehouse, SqlWarehouse, Warehouse};
