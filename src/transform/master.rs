//! Lookup tables over customer and product master data

use crate::error::{EtlError, Result};
use crate::model::{Dataset, Record};
use serde_json::Value;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::borrow::Borrow;
use std::hash::Hash;

/// Master records indexed by join key, first record per key wins
pub(crate) struct MasterIndex<'a, K> {
    records: HashMap<K, &'a Record>,
    attribute_columns: Vec<String>,
}

impl<'a, K: Hash + Eq> MasterIndex<'a, K> {
    /// Index `dataset` by `key_column`
    ///
    /// Records with a null key can never match and are skipped. Columns in
    /// `owned` belong to the dimension itself and are not copied; they are
    /// matched ignoring ASCII case, as warehouse identifiers are.
    pub(crate) fn build(
        dataset: &'a Dataset,
        label: &str,
        key_column: &str,
        owned: &[&str],
        key: impl Fn(&Value) -> std::result::Result<Option<K>, String>,
    ) -> Result<Self> {
        let mut records = HashMap::new();
        let mut duplicates = 0usize;
        let mut null_keys = 0usize;

        for (index, record) in dataset.records().iter().enumerate() {
            let raw = record.get(key_column).unwrap_or(&Value::Null);
            let parsed = key(raw).map_err(|reason| {
                EtlError::data_quality(label, index + 1, format!("{} {}", key_column, reason))
            })?;
            let Some(parsed) = parsed else {
                null_keys += 1;
                continue;
            };
            match records.entry(parsed) {
                Entry::Occupied(_) => duplicates += 1,
                Entry::Vacant(slot) => {
                    slot.insert(record);
                }
            }
        }

        if duplicates > 0 {
            log::warn!(
                "{} duplicate {} record(s) in {}; keeping the first per {}",
                duplicates,
                label,
                dataset.source(),
                key_column
            );
        }
        if null_keys > 0 {
            log::debug!("Skipped {} {} record(s) with a null {}", null_keys, label, key_column);
        }

        let attribute_columns = dataset
            .columns()
            .iter()
            .filter(|c| !owned.iter().any(|o| o.eq_ignore_ascii_case(c)))
            .cloned()
            .collect();

        Ok(Self {
            records,
            attribute_columns,
        })
    }

    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&'a Record>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.records.get(key).copied()
    }

    pub(crate) fn attribute_columns(&self) -> &[String] {
        &self.attribute_columns
    }

    /// Attribute values for `key`, nulls when there is no match
    pub(crate) fn attributes<Q>(&self, key: &Q) -> Vec<Value>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let record = self.get(key);
        self.attribute_columns
            .iter()
            .map(|c| {
                record
                    .and_then(|r| r.get(c))
                    .cloned()
                    .unwrap_or(Value::Null)
            })
            .collect()
    }
}
