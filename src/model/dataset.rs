//! Ordered record sequence produced by extraction

use crate::error::{EtlError, Result};
use serde_json::{Map, Value};

/// One extracted row: column name to value, in source column order
pub type Record = Map<String, Value>;

/// A fully materialized source file
///
/// Columns are known up front (CSV header, or every key seen in a JSON
/// source) so column presence can be checked before any row is touched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    source: String,
    columns: Vec<String>,
    records: Vec<Record>,
}

impl Dataset {
    pub fn new(source: impl Into<String>, columns: Vec<String>, records: Vec<Record>) -> Self {
        Self {
            source: source.into(),
            columns,
            records,
        }
    }

    /// Build a dataset whose columns are every key in first-seen order
    pub fn from_records(source: impl Into<String>, records: Vec<Record>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in &records {
            for key in record.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }
        Self::new(source, columns, records)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Fail with `SchemaMismatch` if the dataset is empty or lacks a column
    ///
    /// `label` names the dataset in the error (e.g. "transactions").
    pub fn require_columns(&self, label: &str, required: &[&str]) -> Result<()> {
        if self.is_empty() {
            return Err(EtlError::schema_mismatch(
                label,
                format!("dataset '{}' has no rows", self.source),
            ));
        }

        let missing: Vec<&str> = required
            .iter()
            .copied()
            .filter(|c| !self.has_column(c))
            .collect();

        if !missing.is_empty() {
            return Err(EtlError::schema_mismatch(
                label,
                format!("missing required column(s): {}", missing.join(", ")),
            ));
        }

        Ok(())
    }
}
