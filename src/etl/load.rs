//! Loader trait for loading tables into the warehouse

use crate::error::Result;
use crate::warehouse::Table;

/// Loader trait for writing one table to a relational sink
///
/// Each call replaces the named table's full contents. Atomicity is
/// whatever the sink provides for a single table; nothing spans tables.
///
/// # Example
/// ```no_run
/// use retail_star_etl::etl::Loader;
/// use retail_star_etl::error::Result;
/// use retail_star_etl::warehouse::Table;
///
/// struct CountingLoader;
///
/// impl Loader for CountingLoader {
///     async fn load(&self, table: &Table, name: &str) -> Result<usize> {
///         println!("would replace {}", name);
///         Ok(table.len())
///     }
/// }
/// ```
pub trait Loader: Send + Sync {
    /// Replace the table `name` with `table`
    ///
    /// Returns the number of rows written
    ///
    /// # Errors
    /// Returns `LoadFailed` carrying the table name and cause
    fn load(
        &self,
        table: &Table,
        name: &str,
    ) -> impl std::future::Future<Output = Result<usize>> + Send;
}
