//! SQL Server / Azure SQL warehouse over `tiberius`

use super::{CellValue, ColumnKind, DEFAULT_BATCH_SIZE, Dialect, Table};
use crate::error::{BoxError, EtlError, Result};
use crate::etl::Loader;
use tiberius::{AuthMethod, Client, Config, Query};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

type MsSqlClient = Client<Compat<TcpStream>>;

/// Loader that replaces tables in SQL Server or Azure SQL
///
/// Every load opens its own connection and runs in one transaction: drop
/// the table, recreate it, insert the rows in batches, commit. An unfinished
/// transaction is rolled back by the server when the connection closes.
///
/// # Example
/// ```no_run
/// use retail_star_etl::warehouse::MsSqlWarehouse;
///
/// let warehouse = MsSqlWarehouse::new(
///     "tcp:retail.database.windows.net,1433",
///     None,
///     "retail",
///     "etl",
///     "secret",
/// )
/// .with_batch_size(500);
/// ```
#[derive(Clone)]
pub struct MsSqlWarehouse {
    config: Config,
    host: String,
    database: String,
    batch_size: usize,
}

impl MsSqlWarehouse {
    /// Describe the target; nothing connects until the first load
    ///
    /// `server` may use the ODBC form `tcp:host,port`. A port given there
    /// wins over `port`, which defaults to 1433.
    pub fn new(
        server: &str,
        port: Option<u16>,
        database: &str,
        username: &str,
        password: &str,
    ) -> Self {
        let (host, server_port) = split_server(server);
        let port = server_port
            .or(port)
            .or(Dialect::MsSql.default_port())
            .unwrap_or(1433);

        let mut config = Config::new();
        config.host(host);
        config.port(port);
        config.database(database);
        config.authentication(AuthMethod::sql_server(username, password));

        Self {
            config,
            host: format!("{}:{}", host, port),
            database: database.to_string(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the number of rows per INSERT statement (minimum 1)
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// `host:port` the warehouse connects to
    pub fn address(&self) -> &str {
        &self.host
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    async fn connect(&self) -> std::result::Result<MsSqlClient, BoxError> {
        let mut config = self.config.clone();
        let tcp = TcpStream::connect(config.get_addr()).await?;
        tcp.set_nodelay(true)?;

        match Client::connect(config.clone(), tcp.compat_write()).await {
            Ok(client) => Ok(client),
            // Azure SQL gateways hand the session over to the database node
            Err(tiberius::error::Error::Routing { host, port }) => {
                log::debug!("Redirected to {}:{}", host, port);
                config.host(&host);
                config.port(port);
                let tcp = TcpStream::connect(config.get_addr()).await?;
                tcp.set_nodelay(true)?;
                Ok(Client::connect(config, tcp.compat_write()).await?)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn replace(&self, table: &Table, name: &str) -> std::result::Result<usize, BoxError> {
        let dialect = Dialect::MsSql;
        let mut client = self.connect().await?;

        run(&mut client, "BEGIN TRANSACTION").await?;
        run(&mut client, &dialect.drop_table_sql(name)).await?;
        run(&mut client, &dialect.create_table_sql(name, table)).await?;

        let mut written = 0;
        let rows_per_batch = dialect.rows_per_batch(self.batch_size, table);
        for (batch, rows) in table.rows().chunks(rows_per_batch).enumerate() {
            let mut query = Query::new(dialect.insert_sql(name, table, rows.len()));
            for row in rows {
                for (cell, column) in row.iter().zip(table.columns()) {
                    bind_cell(&mut query, cell, column.kind);
                }
            }
            query.execute(&mut client).await?;
            written += rows.len();
            log::debug!("{}: batch {} written ({} rows)", name, batch + 1, rows.len());
        }

        run(&mut client, "COMMIT TRANSACTION").await?;
        client.close().await?;
        Ok(written)
    }
}

impl std::fmt::Debug for MsSqlWarehouse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MsSqlWarehouse")
            .field("host", &self.host)
            .field("database", &self.database)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

async fn run(client: &mut MsSqlClient, sql: &str) -> std::result::Result<(), BoxError> {
    client.simple_query(sql).await?.into_results().await?;
    Ok(())
}

fn bind_cell(query: &mut Query<'_>, cell: &CellValue, kind: ColumnKind) {
    match cell {
        CellValue::Null => match kind {
            ColumnKind::Integer => query.bind(None::<i64>),
            ColumnKind::Float => query.bind(None::<f64>),
            ColumnKind::Boolean => query.bind(None::<bool>),
            ColumnKind::Date => query.bind(None::<chrono::NaiveDate>),
            ColumnKind::Text => query.bind(None::<String>),
        },
        CellValue::Integer(v) => query.bind(*v),
        CellValue::Float(v) => query.bind(*v),
        CellValue::Boolean(v) => query.bind(*v),
        CellValue::Date(v) => query.bind(*v),
        CellValue::Text(v) => query.bind(v.clone()),
    }
}

/// Split the ODBC `tcp:host,port` server form
fn split_server(server: &str) -> (&str, Option<u16>) {
    let server = server.trim();
    let server = server.strip_prefix("tcp:").unwrap_or(server);
    match server.rsplit_once(',') {
        Some((host, port)) => match port.trim().parse() {
            Ok(port) => (host.trim(), Some(port)),
            Err(_) => (server, None),
        },
        None => (server, None),
    }
}

impl Loader for MsSqlWarehouse {
    async fn load(&self, table: &Table, name: &str) -> Result<usize> {
        log::debug!("Replacing {} in mssql warehouse {}", name, self.host);
        self.replace(table, name)
            .await
            .map_err(|e| EtlError::load_failed(name, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::warehouse::Column;

    #[test]
    fn test_split_server_forms() {
        assert_eq!(
            split_server("tcp:retail.database.windows.net,1433"),
            ("retail.database.windows.net", Some(1433))
        );
        assert_eq!(split_server("localhost"), ("localhost", None));
        assert_eq!(split_server("db.internal,14330"), ("db.internal", Some(14330)));
    }

    #[test]
    fn test_port_precedence() {
        let odbc = MsSqlWarehouse::new("tcp:db.internal,1444", Some(2000), "retail", "sa", "pw");
        assert_eq!(odbc.address(), "db.internal:1444");
        let plain = MsSqlWarehouse::new("db.internal", Some(2000), "retail", "sa", "pw");
        assert_eq!(plain.address(), "db.internal:2000");
        let default = MsSqlWarehouse::new("db.internal", None, "retail", "sa", "pw");
        assert_eq!(default.address(), "db.internal:1433");
    }

    #[test]
    fn test_debug_hides_password() {
        let warehouse = MsSqlWarehouse::new("db.internal", None, "retail", "sa", "hunter2");
        let debug = format!("{:?}", warehouse);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("retail"));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_load_failed() {
        // nothing listens on port 1 of the loopback interface
        let warehouse = MsSqlWarehouse::new("127.0.0.1", Some(1), "retail", "sa", "pw");
        let mut table = Table::new(vec![Column::new("date_key", ColumnKind::Integer)]);
        table.push(vec![CellValue::Integer(20111209)]);

        let err = warehouse.load(&table, "DimDate").await.unwrap_err();
        assert!(matches!(err, EtlError::LoadFailed { ref table, .. } if table == "DimDate"));
    }
}
