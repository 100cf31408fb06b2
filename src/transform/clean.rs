//! Transaction cleaning
//!
//! Drops rows that cannot take part in the star schema and coerces the
//! survivors into typed [`CleanTransaction`]s.

use crate::error::{EtlError, Result};
use crate::model::{Dataset, Record};
use crate::model::value::{float, integer, text, timestamp};
use chrono::NaiveDateTime;
use serde_json::Value;

pub(crate) const LABEL: &str = "transactions";

/// Columns every transactions file must carry
pub const TRANSACTION_COLUMNS: [&str; 8] = [
    "InvoiceNo",
    "StockCode",
    "Description",
    "Quantity",
    "InvoiceDate",
    "UnitPrice",
    "CustomerID",
    "Country",
];

/// A transaction line that passed cleaning
///
/// Quantity and UnitPrice are strictly positive and
/// `revenue == quantity as f64 * unit_price`.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanTransaction {
    pub invoice_no: Option<String>,
    /// Null StockCodes survive cleaning and fall out at the product join
    pub stock_code: Option<String>,
    pub description: String,
    pub quantity: i64,
    pub invoice_date: NaiveDateTime,
    pub unit_price: f64,
    pub customer_id: i64,
    pub country: Option<String>,
    pub revenue: f64,
}

#[derive(Debug, Default)]
pub struct CleanedTransactions {
    pub rows: Vec<CleanTransaction>,
    pub dropped_missing: usize,
    pub dropped_non_positive: usize,
}

/// Clean the raw transactions
///
/// Order matters for which rows can raise errors: rows missing a
/// CustomerID or Description are dropped before any coercion,
/// while a malformed date or measure fails the run even on a row the
/// quantity/price filter would have dropped.
///
/// # Errors
/// - `SchemaMismatch` if the dataset is empty or lacks a column
/// - `DataQuality` if CustomerID, Quantity, UnitPrice or InvoiceDate
///   cannot be coerced
pub fn clean_transactions(dataset: &Dataset) -> Result<CleanedTransactions> {
    dataset.require_columns(LABEL, &TRANSACTION_COLUMNS)?;

    let mut cleaned = CleanedTransactions::default();

    for (index, record) in dataset.records().iter().enumerate() {
        let row = index + 1;

        let customer = field(record, "CustomerID");
        let Some(description) = text(field(record, "Description")) else {
            cleaned.dropped_missing += 1;
            continue;
        };
        if customer.is_null() {
            cleaned.dropped_missing += 1;
            continue;
        }

        let customer_id = integer(customer)
            .map_err(|r| coercion_error(row, "CustomerID", r))?
            .ok_or_else(|| EtlError::data_quality(LABEL, row, "CustomerID is null"))?;
        let invoice_date = timestamp(field(record, "InvoiceDate"))
            .map_err(|r| coercion_error(row, "InvoiceDate", r))?;
        let quantity =
            integer(field(record, "Quantity")).map_err(|r| coercion_error(row, "Quantity", r))?;
        let unit_price =
            float(field(record, "UnitPrice")).map_err(|r| coercion_error(row, "UnitPrice", r))?;

        let (Some(quantity), Some(unit_price)) = (
            quantity.filter(|q| *q > 0),
            unit_price.filter(|p| *p > 0.0),
        ) else {
            cleaned.dropped_non_positive += 1;
            continue;
        };

        let invoice_date = invoice_date
            .ok_or_else(|| EtlError::data_quality(LABEL, row, "InvoiceDate is null"))?;

        cleaned.rows.push(CleanTransaction {
            invoice_no: text(field(record, "InvoiceNo")),
            stock_code: text(field(record, "StockCode")),
            description,
            quantity,
            invoice_date,
            unit_price,
            customer_id,
            country: text(field(record, "Country")),
            revenue: quantity as f64 * unit_price,
        });
    }

    log::debug!(
        "Cleaned {} of {} transaction(s)",
        cleaned.rows.len(),
        dataset.len()
    );

    Ok(cleaned)
}

fn field<'r>(record: &'r Record, name: &str) -> &'r Value {
    record.get(name).unwrap_or(&Value::Null)
}

fn coercion_error(row: usize, column: &str, reason: String) -> EtlError {
    EtlError::data_quality(LABEL, row, format!("{} {}", column, reason))
}
