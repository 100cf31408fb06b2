//! Data shapes that flow between the pipeline stages
//!
//! - [`Dataset`]: what the extractor hands to the transformer
//! - [`StarSchema`]: what the transformer hands to the loader

mod dataset;
mod star;
pub mod value;

pub use dataset::{Dataset, Record};
pub use star::{
    DimCustomer, DimDate, DimProduct, Dimension, FactSales, StarSchema, TransformStats,
};
