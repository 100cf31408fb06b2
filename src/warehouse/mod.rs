//! Relational sinks for the star schema
//!
//! - [`SqlWarehouse`]: Postgres, MySQL or SQLite through `sqlx`
//! - [`MsSqlWarehouse`]: SQL Server and Azure SQL through `tiberius`
//! - [`MemoryWarehouse`]: in-process tables for dry runs and tests

mod dialect;
mod memory;
mod mssql;
mod sql;
mod table;

pub use dialect::Dialect;
pub use memory::MemoryWarehouse;
pub use mssql::MsSqlWarehouse;
pub use sql::{DEFAULT_BATCH_SIZE, SqlWarehouse};
pub use table::{CellValue, Column, ColumnKind, IntoTable, Table};

use crate::error::Result;
use crate::etl::Loader;

/// The warehouse chosen at startup
#[derive(Debug, Clone)]
pub enum Warehouse {
    Sql(SqlWarehouse),
    MsSql(MsSqlWarehouse),
    Memory(MemoryWarehouse),
}

impl Loader for Warehouse {
    async fn load(&self, table: &Table, name: &str) -> Result<usize> {
        match self {
            Warehouse::Sql(sql) => sql.load(table, name).await,
            Warehouse::MsSql(mssql) => mssql.load(table, name).await,
            Warehouse::Memory(memory) => memory.load(table, name).await,
        }
    }
}
