//! FactSales construction

use super::clean::CleanTransaction;
use super::dates::date_key;
use crate::model::{DimCustomer, DimProduct, Dimension, FactSales};
use std::collections::HashSet;

/// Inner join of the cleaned transactions against both dimensions
///
/// Returns the fact rows and how many transactions found no customer or
/// product row. Those transactions are dropped without an error; the count
/// exists only for reconciliation.
pub fn build_fact_sales(
    transactions: &[CleanTransaction],
    customers: &Dimension<DimCustomer>,
    products: &Dimension<DimProduct>,
) -> (Vec<FactSales>, usize) {
    let customer_keys: HashSet<i64> = customers.rows.iter().map(|c| c.customer_key).collect();
    let product_keys: HashSet<&str> = products
        .rows
        .iter()
        .map(|p| p.product_key.as_str())
        .collect();

    let facts: Vec<FactSales> = transactions
        .iter()
        .filter(|t| customer_keys.contains(&t.customer_id))
        .filter_map(|t| {
            let product_key = t
                .stock_code
                .as_deref()
                .filter(|code| product_keys.contains(code))?;
            Some(FactSales {
                invoice_no: t.invoice_no.clone(),
                date_key: date_key(t.invoice_date.date()),
                customer_key: t.customer_id,
                product_key: product_key.to_string(),
                quantity: t.quantity,
                unit_price: t.unit_price,
                revenue: t.revenue,
            })
        })
        .collect();

    let dropped = transactions.len() - facts.len();
    (facts, dropped)
}
