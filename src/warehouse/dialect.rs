//! SQL text for the supported warehouse backends

use super::{ColumnKind, Table};
use std::str::FromStr;

/// SQL flavour spoken by the sink
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
    /// SQL Server and Azure SQL, over TDS
    MsSql,
}

impl Dialect {
    /// URL scheme of the backend
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MySql => "mysql",
            Self::Sqlite => "sqlite",
            Self::MsSql => "mssql",
        }
    }

    pub fn default_port(&self) -> Option<u16> {
        match self {
            Self::Postgres => Some(5432),
            Self::MySql => Some(3306),
            Self::Sqlite => None,
            Self::MsSql => Some(1433),
        }
    }

    /// Whether the backend is reached over the network
    pub fn is_networked(&self) -> bool {
        !matches!(self, Self::Sqlite)
    }

    pub fn quote(&self, identifier: &str) -> String {
        match self {
            Self::MySql => format!("`{}`", identifier.replace('`', "``")),
            Self::MsSql => format!("[{}]", identifier.replace(']', "]]")),
            Self::Postgres | Self::Sqlite => format!("\"{}\"", identifier.replace('"', "\"\"")),
        }
    }

    fn column_type(&self, kind: ColumnKind) -> &'static str {
        match (self, kind) {
            (Self::Sqlite, ColumnKind::Integer) => "INTEGER",
            (Self::Sqlite, ColumnKind::Float) => "REAL",
            // SQLite has no date type; ISO-8601 text sorts correctly
            (Self::Sqlite, ColumnKind::Date) => "TEXT",
            (Self::Postgres, ColumnKind::Float) => "DOUBLE PRECISION",
            (Self::MsSql, ColumnKind::Float) => "FLOAT",
            (Self::MsSql, ColumnKind::Boolean) => "BIT",
            (Self::MsSql, ColumnKind::Text) => "NVARCHAR(MAX)",
            (_, ColumnKind::Integer) => "BIGINT",
            (_, ColumnKind::Float) => "DOUBLE",
            (_, ColumnKind::Boolean) => "BOOLEAN",
            (_, ColumnKind::Date) => "DATE",
            (_, ColumnKind::Text) => "TEXT",
        }
    }

    /// Placeholder for the 1-based parameter `index`
    fn placeholder(&self, index: usize, kind: ColumnKind) -> String {
        match (self, kind) {
            // Dates travel as text; Postgres will not coerce a text parameter
            (Self::Postgres, ColumnKind::Date) => format!("CAST(${} AS DATE)", index),
            (Self::Postgres, _) => format!("${}", index),
            (Self::MsSql, _) => format!("@P{}", index),
            _ => "?".to_string(),
        }
    }

    /// Bind parameters one statement may carry
    fn max_bind_params(&self) -> usize {
        match self {
            // 2100 per request, less headroom for the procedure call
            Self::MsSql => 2_000,
            _ => 32_766,
        }
    }

    /// Rows a single VALUES list may carry
    fn max_rows_per_insert(&self) -> usize {
        match self {
            Self::MsSql => 1_000,
            _ => usize::MAX,
        }
    }

    /// Rows per INSERT for `table`, at most `batch_size` and never zero
    pub(crate) fn rows_per_batch(&self, batch_size: usize, table: &Table) -> usize {
        let width = table.columns().len().max(1);
        batch_size
            .min(self.max_bind_params() / width)
            .min(self.max_rows_per_insert())
            .max(1)
    }

    pub(crate) fn drop_table_sql(&self, name: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote(name))
    }

    pub(crate) fn create_table_sql(&self, name: &str, table: &Table) -> String {
        let columns = table
            .columns()
            .iter()
            .map(|c| format!("{} {}", self.quote(&c.name), self.column_type(c.kind)))
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE TABLE {} ({})", self.quote(name), columns)
    }

    pub(crate) fn insert_sql(&self, name: &str, table: &Table, rows: usize) -> String {
        let columns = table
            .columns()
            .iter()
            .map(|c| self.quote(&c.name))
            .collect::<Vec<_>>()
            .join(", ");
        let width = table.columns().len();
        let values = (0..rows)
            .map(|r| {
                let row = table
                    .columns()
                    .iter()
                    .enumerate()
                    .map(|(i, c)| self.placeholder(r * width + i + 1, c.kind))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("({})", row)
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            self.quote(name),
            columns,
            values
        )
    }
}

impl FromStr for Dialect {
    type Err = String;

    /// Accepts driver names, including ODBC driver strings such as
    /// `{ODBC Driver 18 for SQL Server}`
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "mssql" | "sqlserver" | "azuresql" | "tds" => Ok(Self::MsSql),
            other if other.contains("sql server") => Ok(Self::MsSql),
            other => Err(format!(
                "unsupported database driver '{}' (expected postgres, mysql, sqlite or a SQL Server driver)",
                other
            )),
        }
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.scheme())
    }
}
