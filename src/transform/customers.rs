//! DimCustomer construction

use super::clean::CleanTransaction;
use super::master::MasterIndex;
use crate::error::Result;
use crate::model::value::integer;
use crate::model::{Dataset, DimCustomer, Dimension};
use std::collections::HashSet;

pub(crate) const LABEL: &str = "customers";

/// Columns every customers file must carry
pub const CUSTOMER_COLUMNS: [&str; 1] = ["CustomerID"];

/// Master columns the dimension fills from transactions instead
const OWNED_COLUMNS: [&str; 3] = ["CustomerID", "customer_key", "Country"];

/// One row per distinct CustomerID, left joined with the customer master
///
/// Country is taken from the first transaction seen for the customer.
/// Customers absent from the master keep null attributes.
pub fn build_dim_customer(
    transactions: &[CleanTransaction],
    customers: &Dataset,
) -> Result<Dimension<DimCustomer>> {
    let master = MasterIndex::build(customers, LABEL, "CustomerID", &OWNED_COLUMNS, integer)?;

    let mut seen = HashSet::new();
    let mut unmatched = 0usize;
    let rows: Vec<DimCustomer> = transactions
        .iter()
        .filter(|t| seen.insert(t.customer_id))
        .map(|t| {
            if master.get(&t.customer_id).is_none() {
                unmatched += 1;
            }
            DimCustomer {
                customer_key: t.customer_id,
                country: t.country.clone(),
                attributes: master.attributes(&t.customer_id),
            }
        })
        .collect();

    if unmatched > 0 {
        log::debug!("{} customer(s) have no master record", unmatched);
    }

    Ok(Dimension {
        attribute_columns: master.attribute_columns().to_vec(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EtlError;
    use serde_json::{Value, json};

    fn transaction(customer_id: i64, country: &str) -> CleanTransaction {
        CleanTransaction {
            invoice_no: Some("1".into()),
            stock_code: Some("A".into()),
            description: "A".into(),
            quantity: 1,
            invoice_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
            unit_price: 1.0,
            customer_id,
            country: Some(country.into()),
            revenue: 1.0,
        }
    }

    fn customers(rows: Value) -> Dataset {
        let records = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r.as_object().cloned().unwrap())
            .collect();
        Dataset::from_records("customers.json", records)
    }

    #[test]
    fn test_first_seen_country_wins() {
        let rows = vec![transaction(7, "US"), transaction(7, "UK")];
        let master = customers(json!([{"CustomerID": 7, "Age": 30}]));
        let dim = build_dim_customer(&rows, &master).unwrap();
        assert_eq!(dim.len(), 1);
        assert_eq!(dim.rows[0].country.as_deref(), Some("US"));
    }

    #[test]
    fn test_left_join_keeps_unmatched_as_null() {
        let rows = vec![transaction(1, "UK"), transaction(2, "FR")];
        let master = customers(json!([{"CustomerID": "1", "Age": 30, "Segment": "Gold"}]));
        let dim = build_dim_customer(&rows, &master).unwrap();

        assert_eq!(dim.attribute_columns, vec!["Age", "Segment"]);
        assert_eq!(dim.rows[0].attributes, vec![json!(30), json!("Gold")]);
        assert_eq!(dim.rows[1].attributes, vec![Value::Null, Value::Null]);
    }

    #[test]
    fn test_master_country_is_not_copied() {
        let rows = vec![transaction(1, "UK")];
        let master = customers(json!([{"CustomerID": 1, "Country": "Atlantis", "Age": 30}]));
        let dim = build_dim_customer(&rows, &master).unwrap();
        assert_eq!(dim.attribute_columns, vec!["Age"]);
        assert_eq!(dim.rows[0].country.as_deref(), Some("UK"));
    }

    #[test]
    fn test_lowercase_master_country_is_not_copied() {
        let rows = vec![transaction(1, "UK")];
        let master = customers(json!([{"customerid": 1, "CustomerID": 1, "country": "FR"}]));
        let dim = build_dim_customer(&rows, &master).unwrap();
        assert!(dim.attribute_columns.is_empty());
    }

    #[test]
    fn test_duplicate_master_records_keep_first() {
        let rows = vec![transaction(1, "UK")];
        let master = customers(json!([
            {"CustomerID": 1, "Age": 30},
            {"CustomerID": 1, "Age": 99}
        ]));
        let dim = build_dim_customer(&rows, &master).unwrap();
        assert_eq!(dim.len(), 1);
        assert_eq!(dim.rows[0].attributes, vec![json!(30)]);
    }

    #[test]
    fn test_bad_master_key_is_data_quality_error() {
        let master = customers(json!([{"CustomerID": "VIP-1"}]));
        let err = build_dim_customer(&[transaction(1, "UK")], &master).unwrap_err();
        assert!(matches!(err, EtlError::DataQuality { .. }));
    }
}
