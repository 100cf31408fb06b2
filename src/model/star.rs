//! Star schema rows produced by the transformer

use chrono::NaiveDate;
use serde_json::Value;

/// One calendar date seen in the cleaned transactions
#[derive(Debug, Clone, PartialEq)]
pub struct DimDate {
    /// YYYYMMDD as an integer, e.g. 20240305
    pub date_key: i64,
    pub full_date: NaiveDate,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub quarter: u32,
    /// English weekday name ("Monday" .. "Sunday")
    pub weekday: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimCustomer {
    pub customer_key: i64,
    /// Country of the first transaction seen for this customer
    pub country: Option<String>,
    /// Customer master values, aligned with [`Dimension::attribute_columns`]
    pub attributes: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DimProduct {
    pub product_key: String,
    pub description: String,
    pub category: String,
    pub brand: String,
    /// Product master values, aligned with [`Dimension::attribute_columns`]
    pub attributes: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactSales {
    pub invoice_no: Option<String>,
    pub date_key: i64,
    pub customer_key: i64,
    pub product_key: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub revenue: f64,
}

/// A dimension whose trailing columns come from master data
///
/// Every row carries one attribute value per entry of `attribute_columns`;
/// rows without a master match carry nulls.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension<R> {
    pub attribute_columns: Vec<String>,
    pub rows: Vec<R>,
}

impl<R> Dimension<R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Row counts gathered while transforming, for reconciliation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    pub raw_transactions: usize,
    /// Dropped for a null CustomerID, Description or StockCode
    pub dropped_missing: usize,
    /// Dropped for Quantity <= 0 or UnitPrice <= 0
    pub dropped_non_positive: usize,
    pub cleaned_transactions: usize,
    pub fact_rows: usize,
    /// Cleaned rows that found no customer or product dimension row
    pub dropped_unmatched: usize,
}

/// Output of a transform run: four tables ready to load
#[derive(Debug, Clone, PartialEq)]
pub struct StarSchema {
    pub dim_date: Vec<DimDate>,
    pub dim_customer: Dimension<DimCustomer>,
    pub dim_product: Dimension<DimProduct>,
    pub fact_sales: Vec<FactSales>,
    pub stats: TransformStats,
}
