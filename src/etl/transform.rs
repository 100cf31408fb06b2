//! Transformer trait for data transformation

use crate::error::Result;

/// Transformer trait for reshaping extracted data
///
/// Transforms are pure: the same input always yields the same output or
/// the same error, so there is nothing to retry.
///
/// # Example
/// ```
/// use retail_star_etl::etl::Transformer;
/// use retail_star_etl::error::Result;
///
/// struct RowCounter;
///
/// impl Transformer for RowCounter {
///     type Input = Vec<String>;
///     type Output = usize;
///
///     fn transform(&self, input: Self::Input) -> Result<Self::Output> {
///         Ok(input.len())
///     }
/// }
///
/// assert_eq!(RowCounter.transform(vec!["a".into()]).unwrap(), 1);
/// ```
pub trait Transformer: Send + Sync {
    /// Input type
    type Input: Send;

    /// Output type after transformation
    type Output: Send;

    /// Transform the input
    ///
    /// # Errors
    /// Returns an error if the input violates its schema or cannot be coerced
    fn transform(&self, input: Self::Input) -> Result<Self::Output>;
}
