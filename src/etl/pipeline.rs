//! Pipeline orchestration for the retail ETL run

use super::{Extractor, Loader, Transformer};
use crate::error::Result;
use crate::model::{Dataset, StarSchema, TransformStats};
use crate::transform::SourceDatasets;

/// Warehouse table names, in load order (dimensions before facts)
pub const TARGET_TABLES: [&str; 4] = ["DimDate", "DimCustomer", "DimProduct", "FactSales"];

/// Storage paths of the three source files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub transactions: String,
    pub products: String,
    pub customers: String,
}

impl Default for SourcePaths {
    fn default() -> Self {
        Self {
            transactions: "transactions/2024/1/15/transactions_20111209.csv".to_string(),
            products: "products/2024/1/15/product_catalog.json".to_string(),
            customers: "customers/2024/1/15/customer_data.json".to_string(),
        }
    }
}

/// Result of loading one table
#[derive(Debug)]
pub struct LoadOutcome {
    pub table: String,
    /// Rows written, or the `LoadFailed` error
    pub result: Result<usize>,
}

impl LoadOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of a completed run
///
/// A run that reaches the load stage always produces a report, even when
/// some tables failed; callers decide whether partial success is acceptable.
#[derive(Debug)]
pub struct RunReport {
    pub transactions_extracted: usize,
    pub products_extracted: usize,
    pub customers_extracted: usize,
    pub stats: TransformStats,
    /// One outcome per table, in [`TARGET_TABLES`] order
    pub loads: Vec<LoadOutcome>,
}

impl RunReport {
    /// True when every table was replaced
    pub fn all_loaded(&self) -> bool {
        self.loads.iter().all(LoadOutcome::is_ok)
    }

    pub fn failed_tables(&self) -> Vec<&str> {
        self.loads
            .iter()
            .filter(|o| !o.is_ok())
            .map(|o| o.table.as_str())
            .collect()
    }

    pub fn rows_loaded(&self) -> usize {
        self.loads
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }
}

/// ETL Pipeline that orchestrates Extract, Transform, and Load operations
///
/// # Type Parameters
/// - `E`: Extractor used for all three sources
/// - `T`: Transformer from the three datasets to a star schema
/// - `L`: Loader receiving the four tables
///
/// # Example
/// ```no_run
/// use retail_star_etl::etl::Pipeline;
/// use retail_star_etl::storage::BlobStore;
/// use retail_star_etl::transform::StarSchemaTransformer;
/// use retail_star_etl::warehouse::MemoryWarehouse;
///
/// # async fn example() -> retail_star_etl::error::Result<()> {
/// let store = BlobStore::from_connection_string("file:///srv/lake", "retail")?;
/// let pipeline = Pipeline::new(store, StarSchemaTransformer::new(), MemoryWarehouse::new());
///
/// let report = pipeline.run().await?;
/// println!("Loaded {} rows", report.rows_loaded());
/// # Ok(())
/// # }
/// ```
pub struct Pipeline<E, T, L> {
    extractor: E,
    transformer: T,
    loader: L,
    sources: SourcePaths,
}

impl<E, T, L> Pipeline<E, T, L>
where
    E: Extractor,
    T: Transformer<Input = SourceDatasets, Output = StarSchema>,
    L: Loader,
{
    /// Create a new pipeline reading the default source paths
    pub fn new(extractor: E, transformer: T, loader: L) -> Self {
        Self {
            extractor,
            transformer,
            loader,
            sources: SourcePaths::default(),
        }
    }

    /// Override the source paths
    pub fn with_sources(mut self, sources: SourcePaths) -> Self {
        self.sources = sources;
        self
    }

    pub fn sources(&self) -> &SourcePaths {
        &self.sources
    }

    /// Run the complete ETL pipeline
    ///
    /// Steps:
    /// 1. Extract the three sources; any failure aborts the run
    /// 2. Transform into the star schema; any failure aborts before loading
    /// 3. Load the four tables; each is attempted even if an earlier one failed
    ///
    /// # Errors
    /// Returns an error if extraction or transformation fails. Load failures
    /// are reported in [`RunReport::loads`] instead.
    pub async fn run(&self) -> Result<RunReport> {
        log::info!("Starting ETL pipeline");

        // Extract
        log::info!("Extracting source datasets...");
        let transactions = self.extract_source(&self.sources.transactions).await?;
        let products = self.extract_source(&self.sources.products).await?;
        let customers = self.extract_source(&self.sources.customers).await?;
        log::info!("Data extraction complete");

        let transactions_extracted = transactions.len();
        let products_extracted = products.len();
        let customers_extracted = customers.len();

        // Transform
        log::info!("Transforming into star schema...");
        let schema = self
            .transformer
            .transform(SourceDatasets {
                transactions,
                products,
                customers,
            })
            .inspect_err(|e| log::error!("Transformation failed, nothing loaded: {}", e))?;
        let stats = schema.stats;
        log_reconciliation(&stats);

        // Load
        let tables = schema.into_tables();
        let mut loads = Vec::with_capacity(TARGET_TABLES.len());
        for (name, table) in TARGET_TABLES.iter().zip(tables.iter()) {
            log::info!("Loading {} row(s) into {}...", table.len(), name);
            let result = self.loader.load(table, name).await;
            match &result {
                Ok(count) => log::info!("Loaded {} row(s) into {}", count, name),
                Err(e) => log::error!("{}", e),
            }
            loads.push(LoadOutcome {
                table: name.to_string(),
                result,
            });
        }

        let report = RunReport {
            transactions_extracted,
            products_extracted,
            customers_extracted,
            stats,
            loads,
        };

        if report.all_loaded() {
            log::info!("Pipeline complete: {} row(s) loaded", report.rows_loaded());
        } else {
            log::warn!(
                "Pipeline finished with failed table(s): {}",
                report.failed_tables().join(", ")
            );
        }

        Ok(report)
    }

    async fn extract_source(&self, source_id: &str) -> Result<Dataset> {
        log::debug!("Fetching {}", source_id);
        let dataset = self
            .extractor
            .extract(source_id)
            .await
            .inspect_err(|e| log::error!("Aborting due to extraction failure: {}", e))?;
        log::info!("Extracted {} row(s) from {}", dataset.len(), source_id);
        Ok(dataset)
    }
}

fn log_reconciliation(stats: &TransformStats) {
    log::info!(
        "Transactions: {} raw, {} dropped (missing fields), {} dropped (non-positive), {} cleaned",
        stats.raw_transactions,
        stats.dropped_missing,
        stats.dropped_non_positive,
        stats.cleaned_transactions
    );
    if stats.dropped_unmatched > 0 {
        log::warn!(
            "{} cleaned transaction(s) matched no dimension row and were left out of FactSales",
            stats.dropped_unmatched
        );
    }
    log::info!("FactSales rows: {}", stats.fact_rows);
}
