//! DimProduct construction

use super::clean::CleanTransaction;
use super::master::MasterIndex;
use crate::error::Result;
use crate::model::value::text;
use crate::model::{Dataset, DimProduct, Dimension};
use std::collections::HashSet;

pub(crate) const LABEL: &str = "products";

/// Columns every products file must carry
pub const PRODUCT_COLUMNS: [&str; 3] = ["StockCode", "Category", "Brand"];

/// Placeholder for a Category or Brand the master data does not provide
pub const UNKNOWN: &str = "Unknown";

const OWNED_COLUMNS: [&str; 5] = ["StockCode", "product_key", "Description", "Category", "Brand"];

/// One row per distinct non-null StockCode, left joined with the product master
///
/// Description is taken from the first transaction seen for the product.
/// Category and Brand fall back to [`UNKNOWN`]; other master attributes
/// stay null when there is no match.
pub fn build_dim_product(
    transactions: &[CleanTransaction],
    products: &Dataset,
) -> Result<Dimension<DimProduct>> {
    let master = MasterIndex::build(products, LABEL, "StockCode", &OWNED_COLUMNS, |v| {
        Ok(text(v))
    })?;

    let mut seen = HashSet::new();
    let rows: Vec<DimProduct> = transactions
        .iter()
        .filter_map(|t| Some((t, t.stock_code.as_deref()?)))
        .filter(|&(_, code)| seen.insert(code))
        .map(|(t, code)| {
            let record = master.get(code);
            let lookup = |column: &str| {
                record
                    .and_then(|r| r.get(column))
                    .and_then(text)
                    .unwrap_or_else(|| UNKNOWN.to_string())
            };
            DimProduct {
                description: t.description.clone(),
                category: lookup("Category"),
                brand: lookup("Brand"),
                attributes: master.attributes(code),
                product_key: code.to_string(),
            }
        })
        .collect();

    Ok(Dimension {
        attribute_columns: master.attribute_columns().to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn transaction(stock_code: &str, description: &str) -> CleanTransaction {
        CleanTransaction {
            invoice_no: Some("1".into()),
            stock_code: Some(stock_code.into()),
            description: description.into(),
            quantity: 1,
            invoice_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            unit_price: 1.0,
            customer_id: 1,
            country: None,
            revenue: 1.0,
        }
    }

    fn products(rows: Value) -> Dataset {
        let records = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        Dataset::from_records("products.json", records)
    }

    #[test]
    fn test_missing_product_defaults_to_unknown() {
        let master = products(json!([
            {"StockCode": "85123A", "Category": "Home", "Brand": "Acme", "Price": 2.55}
        ]));
        let dim = build_dim_product(&[transaction("X123", "Mystery")], &master).unwrap();

        let row = &dim.rows[0];
        assert_eq!(row.product_key, "X123");
        assert_eq!(row.category, "Unknown");
        assert_eq!(row.brand, "Unknown");
        assert_eq!(dim.attribute_columns, vec!["Price"]);
        assert_eq!(row.attributes, vec![Value::Null]);
    }

    #[test]
    fn test_null_category_defaults_to_unknown() {
        let master = products(json!([{"StockCode": "A1", "Category": null, "Brand": "Acme"}]));
        let dim = build_dim_product(&[transaction("A1", "Thing")], &master).unwrap();
        assert_eq!(dim.rows[0].category, "Unknown");
        assert_eq!(dim.rows[0].brand, "Acme");
    }

    #[test]
    fn test_numeric_stock_code_joins_text_key() {
        let master = products(json!([
            {"StockCode": 22423, "Category": "Kitchen", "Brand": "Regency"}
        ]));
        let dim = build_dim_product(&[transaction("22423", "Cake stand")], &master).unwrap();
        assert_eq!(dim.rows[0].category, "Kitchen");
    }

    #[test]
    fn test_one_row_per_stock_code_first_description() {
        let rows = vec![
            transaction("A1", "Red mug"),
            transaction("B2", "Blue mug"),
            transaction("A1", "RED MUG"),
        ];
        let master = products(json!([{"StockCode": "A1", "Category": "Mugs", "Brand": "Acme"}]));
        let dim = build_dim_product(&rows, &master).unwrap();
        assert_eq!(dim.len(), 2);
        assert_eq!(dim.rows[0].description, "Red mug");
    }

    #[test]
    fn test_null_stock_code_has_no_product_row() {
        let mut gift_wrap = transaction("A1", "Gift wrap");
        gift_wrap.stock_code = None;
        let master = products(json!([{"StockCode": "A1", "Category": "Mugs", "Brand": "Acme"}]));
        let dim = build_dim_product(&[gift_wrap, transaction("A1", "Mug")], &master).unwrap();
        assert_eq!(dim.len(), 1);
        assert_eq!(dim.rows[0].product_key, "A1");
        assert_eq!(dim.rows[0].description, "Mug");
    }

    #[test]
    fn test_owned_columns_match_ignoring_case() {
        let master = products(json!([
            {"StockCode": "A1", "Category": "Mugs", "Brand": "Acme", "description": "mug", "BRAND": "x"}
        ]));
        let dim = build_dim_product(&[transaction("A1", "Mug")], &master).unwrap();
        assert!(dim.attribute_columns.is_empty());
    }
}
