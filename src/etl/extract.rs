//! Extractor trait for data extraction from storage

use crate::error::Result;
use crate::model::Dataset;

/// Extractor trait for fetching a source file as a [`Dataset`]
///
/// Implementors resolve a logical source identifier (a storage path) to a
/// fully materialized dataset. A partially read source is never returned.
///
/// # Example
/// ```no_run
/// use retail_star_etl::etl::Extractor;
/// use retail_star_etl::error::Result;
/// use retail_star_etl::model::Dataset;
///
/// struct EmptyExtractor;
///
/// impl Extractor for EmptyExtractor {
///     async fn extract(&self, source_id: &str) -> Result<Dataset> {
///         Ok(Dataset::new(source_id, vec![], vec![]))
///     }
/// }
/// ```
pub trait Extractor: Send + Sync {
    /// Extract the dataset stored under `source_id`
    ///
    /// # Errors
    /// - `UnsupportedFormat` if the extension has no parser
    /// - `FetchFailed` on connectivity, authentication or parse failure
    fn extract(
        &self,
        source_id: &str,
    ) -> impl std::future::Future<Output = Result<Dataset>> + Send;
}
