//! In-memory warehouse

use super::Table;
use crate::error::Result;
use crate::etl::Loader;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Warehouse that keeps replaced tables in memory
///
/// Clones share the same tables, so a test can hand one clone to the
/// pipeline and read the results back through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryWarehouse {
    tables: Arc<Mutex<BTreeMap<String, Table>>>,
}

impl MemoryWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a table back
    pub fn table(&self, name: &str) -> Option<Table> {
        self.lock().get(name).cloned()
    }

    pub fn table_names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, Table>> {
        // A panicked writer cannot leave a half-replaced table behind
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Loader for MemoryWarehouse {
    async fn load(&self, table: &Table, name: &str) -> Result<usize> {
        log::debug!("Replacing in-memory table {} ({} rows)", name, table.len());
        self.lock().insert(name.to_string(), table.clone());
        Ok(table.len())
    }
}
