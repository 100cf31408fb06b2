//! Core ETL (Extract, Transform, Load) abstractions
//!
//! This module provides the stage traits and the pipeline that runs
//! them once per batch: extract three source files, transform them into a
//! star schema, load the four resulting tables.

mod extract;
mod load;
mod pipeline;
mod transform;

pub use extract::Extractor;
pub use load::Loader;
pub use pipeline::{LoadOutcome, Pipeline, RunReport, SourcePaths, TARGET_TABLES};
pub use transform::Transformer;
