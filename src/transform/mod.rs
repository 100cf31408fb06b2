//! Star schema transform
//!
//! Turns the three extracted datasets into DimDate, DimCustomer,
//! DimProduct and FactSales:
//! 1. clean the transactions
//! 2. build the date, customer and product dimensions from the survivors
//! 3. inner join the survivors to the dimensions to get the fact rows

mod clean;
mod customers;
mod dates;
mod facts;
mod master;
mod products;

pub use clean::{CleanTransaction, CleanedTransactions, TRANSACTION_COLUMNS, clean_transactions};
pub use customers::{CUSTOMER_COLUMNS, build_dim_customer};
pub use dates::{build_dim_date, date_key};
pub use facts::build_fact_sales;
pub use products::{PRODUCT_COLUMNS, UNKNOWN, build_dim_product};

use crate::error::Result;
use crate::etl::Transformer;
use crate::model::{Dataset, StarSchema, TransformStats};

/// The three extracted sources, as handed from Extractor to Transformer
#[derive(Debug, Clone)]
pub struct SourceDatasets {
    pub transactions: Dataset,
    pub products: Dataset,
    pub customers: Dataset,
}

/// Transformer from [`SourceDatasets`] to a [`StarSchema`]
///
/// # Example
/// ```
/// use retail_star_etl::etl::Transformer;
/// use retail_star_etl::model::Dataset;
/// use retail_star_etl::transform::{SourceDatasets, StarSchemaTransformer};
///
/// let empty = SourceDatasets {
///     transactions: Dataset::default(),
///     products: Dataset::default(),
///     customers: Dataset::default(),
/// };
/// assert!(StarSchemaTransformer::new().transform(empty).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StarSchemaTransformer;

impl StarSchemaTransformer {
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for StarSchemaTransformer {
    type Input = SourceDatasets;
    type Output = StarSchema;

    fn transform(&self, input: Self::Input) -> Result<Self::Output> {
        // Schema problems in any source fail before a single row is touched
        input
            .transactions
            .require_columns(clean::LABEL, &TRANSACTION_COLUMNS)?;
        input
            .products
            .require_columns(products::LABEL, &PRODUCT_COLUMNS)?;
        input
            .customers
            .require_columns(customers::LABEL, &CUSTOMER_COLUMNS)?;

        let cleaned = clean_transactions(&input.transactions)?;
        let transactions = &cleaned.rows;

        log::info!("Creating DimDate...");
        let dim_date = build_dim_date(transactions);

        log::info!("Creating DimCustomer...");
        let dim_customer = build_dim_customer(transactions, &input.customers)?;

        log::info!("Creating DimProduct...");
        let dim_product = build_dim_product(transactions, &input.products)?;

        log::info!("Creating FactSales...");
        let (fact_sales, dropped_unmatched) =
            build_fact_sales(transactions, &dim_customer, &dim_product);

        let stats = TransformStats {
            raw_transactions: input.transactions.len(),
            dropped_missing: cleaned.dropped_missing,
            dropped_non_positive: cleaned.dropped_non_positive,
            cleaned_transactions: transactions.len(),
            fact_rows: fact_sales.len(),
            dropped_unmatched,
        };

        log::info!(
            "Data transformation complete: {} date(s), {} customer(s), {} product(s), {} sale(s)",
            dim_date.len(),
            dim_customer.len(),
            dim_product.len(),
            fact_sales.len()
        );

        Ok(StarSchema {
            dim_date,
            dim_customer,
            dim_product,
            fact_sales,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use serde_json::{Value, json};
    use std::collections::HashSet;

    fn dataset(source: &str, rows: Value) -> Dataset {
        let records = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        Dataset::from_records(source, records)
    }

    fn sale(
        invoice: &str,
        stock: &str,
        qty: i64,
        date: &str,
        price: f64,
        customer: Value,
        country: &str,
    ) -> Value {
        json!({
            "InvoiceNo": invoice,
            "StockCode": stock,
            "Description": format!("Item {}", stock),
            "Quantity": qty,
            "InvoiceDate": date,
            "UnitPrice": price,
            "CustomerID": customer,
            "Country": country
        })
    }

    fn sources() -> SourceDatasets {
        SourceDatasets {
            transactions: dataset(
                "transactions.csv",
                json!([
                    sale("1", "A1", 2, "2011-12-09 08:00:00", 1.25, json!(7), "US"),
                    sale("1", "X123", 1, "2011-12-09 09:00:00", 4.0, json!(7), "UK"),
                    sale("2", "A1", 3, "2011-12-10 10:00:00", 1.25, json!(8), "FR"),
                    sale("3", "B2", -3, "2011-12-10 11:00:00", 5.0, json!(101), "US"),
                    sale("4", "B2", 1, "2011-12-11 11:00:00", 5.0, Value::Null, "US"),
                ]),
            ),
            products: dataset(
                "products.json",
                json!([
                    {"StockCode": "A1", "Category": "Mugs", "Brand": "Acme", "UnitPrice": 9.99},
                    {"StockCode": "B2", "Category": "Plates", "Brand": "Acme", "UnitPrice": 3.0}
                ]),
            ),
            customers: dataset(
                "customers.json",
                json!([{"CustomerID": 7, "Segment": "Gold"}]),
            ),
        }
    }

    #[test]
    fn test_star_schema_shapes() {
        let schema = StarSchemaTransformer::new().transform(sources()).unwrap();

        assert_eq!(schema.stats.raw_transactions, 5);
        assert_eq!(schema.stats.dropped_non_positive, 1);
        assert_eq!(schema.stats.dropped_missing, 1);
        assert_eq!(schema.stats.cleaned_transactions, 3);
        assert_eq!(schema.stats.fact_rows, 3);
        assert_eq!(schema.stats.dropped_unmatched, 0);

        assert_eq!(schema.dim_date.len(), 2);
        assert_eq!(schema.dim_customer.len(), 2);
        assert_eq!(schema.dim_product.len(), 2);

        let seven = &schema.dim_customer.rows[0];
        assert_eq!(seven.customer_key, 7);
        assert_eq!(seven.country.as_deref(), Some("US"));

        let mystery = schema
            .dim_product
            .rows
            .iter()
            .find(|p| p.product_key == "X123")
            .unwrap();
        assert_eq!(mystery.category, "Unknown");
        assert_eq!(mystery.brand, "Unknown");
    }

    #[test]
    fn test_facts_reference_existing_dimension_rows() {
        let schema = StarSchemaTransformer::new().transform(sources()).unwrap();

        let dates: HashSet<i64> = schema.dim_date.iter().map(|d| d.date_key).collect();
        let customers: HashSet<i64> = schema
            .dim_customer
            .rows
            .iter()
            .map(|c| c.customer_key)
            .collect();
        let products: HashSet<&str> = schema
            .dim_product
            .rows
            .iter()
            .map(|p| p.product_key.as_str())
            .collect();

        for fact in &schema.fact_sales {
            assert!(dates.contains(&fact.date_key));
            assert!(customers.contains(&fact.customer_key));
            assert!(products.contains(fact.product_key.as_str()));
            assert_eq!(fact.revenue, fact.quantity as f64 * fact.unit_price);
        }
    }

    #[test]
    fn test_fact_unit_price_is_transaction_side() {
        let schema = StarSchemaTransformer::new().transform(sources()).unwrap();
        let a1 = schema
            .fact_sales
            .iter()
            .find(|f| f.product_key == "A1")
            .unwrap();
        assert_eq!(a1.unit_price, 1.25);
        assert_eq!(schema.dim_product.attribute_columns, vec!["UnitPrice"]);
    }

    #[test]
    fn test_empty_customers_is_schema_mismatch() {
        let mut input = sources();
        input.customers = Dataset::new("customers.json", vec!["CustomerID".into()], vec![]);
        let err = StarSchemaTransformer::new().transform(input).unwrap_err();
        assert!(
            matches!(err, EtlError::SchemaMismatch { ref dataset, .. } if dataset == "customers")
        );
    }

    #[test]
    fn test_products_without_brand_is_schema_mismatch() {
        let mut input = sources();
        input.products = dataset(
            "products.json",
            json!([{"StockCode": "A1", "Category": "Mugs"}]),
        );
        let err = StarSchemaTransformer::new().transform(input).unwrap_err();
        assert!(err.to_string().contains("Brand"));
    }

    #[test]
    fn test_null_stock_code_still_feeds_date_and_customer() {
        let mut rows = json!([
            sale("1", "A1", 1, "2011-12-09 08:00:00", 1.0, json!(1), "US"),
            sale("2", "A1", 1, "2011-12-10 08:00:00", 1.0, json!(2), "UK"),
        ]);
        rows[1]["StockCode"] = Value::Null;
        let mut input = sources();
        input.transactions = dataset("transactions.csv", rows);

        let schema = StarSchemaTransformer::new().transform(input).unwrap();
        assert_eq!(schema.stats.cleaned_transactions, 2);
        assert_eq!(schema.stats.dropped_missing, 0);
        assert_eq!(schema.dim_date.len(), 2);
        assert_eq!(schema.dim_customer.len(), 2);
        assert_eq!(schema.dim_product.len(), 1);
        assert_eq!(schema.stats.fact_rows, 1);
        assert_eq!(schema.stats.dropped_unmatched, 1);
    }

    #[test]
    fn test_transform_is_deterministic() {
        let first = StarSchemaTransformer::new().transform(sources()).unwrap();
        let second = StarSchemaTransformer::new().transform(sources()).unwrap();
        assert_eq!(first, second);
    }
}
