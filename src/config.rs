//! Pipeline configuration
//!
//! Everything the run needs is read once at startup into a
//! [`PipelineConfig`] and validated, so a missing variable fails before any
//! connection is attempted.
//!
//! Expected environment variables:
//! - STORAGE_CONNECTION_STRING: storage account connection string (required)
//! - CONTAINER_NAME: container holding the source files (required)
//! - DB_DRIVER: postgres, mysql, sqlite, mssql or memory (required); ODBC
//!   driver names such as `{ODBC Driver 18 for SQL Server}` select mssql
//! - DB_DATABASE: database name, or file for sqlite (required except memory)
//! - DB_SERVER, DB_USERNAME, DB_PASSWORD: required for networked drivers
//! - DB_PORT: optional, driver default otherwise
//! - TRANSACTIONS_PATH, PRODUCTS_PATH, CUSTOMERS_PATH: optional source paths
//! - LOAD_BATCH_SIZE: optional rows per INSERT (default 1000)

use crate::error::{EtlError, Result};
use crate::etl::SourcePaths;
use crate::storage::BlobStore;
use crate::warehouse::{
    DEFAULT_BATCH_SIZE, Dialect, MemoryWarehouse, MsSqlWarehouse, SqlWarehouse, Warehouse,
};
use url::Url;

/// Where the warehouse lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatabaseDriver {
    Sql(Dialect),
    /// Tables kept in process memory, for dry runs
    Memory,
}

#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub driver: DatabaseDriver,
    pub server: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl DatabaseConfig {
    /// Connection URL for `sqlx`, `None` for warehouses `sqlx` does not serve
    pub fn url(&self) -> Result<Option<String>> {
        let dialect = match self.driver {
            DatabaseDriver::Sql(Dialect::MsSql) | DatabaseDriver::Memory => return Ok(None),
            DatabaseDriver::Sql(dialect) => dialect,
        };

        if !dialect.is_networked() {
            return Ok(Some(if self.database == ":memory:" {
                "sqlite::memory:".to_string()
            } else {
                format!("sqlite://{}?mode=rwc", self.database)
            }));
        }

        let server = self.server.as_deref().unwrap_or_default();
        let mut url = Url::parse(&format!("{}://{}", dialect.scheme(), server))
            .map_err(|e| EtlError::config(format!("invalid DB_SERVER '{}': {}", server, e)))?;
        let credentials_ok = url
            .set_username(self.username.as_deref().unwrap_or_default())
            .and_then(|_| url.set_password(self.password.as_deref()))
            .and_then(|_| url.set_port(self.port.or(dialect.default_port())));
        if credentials_ok.is_err() {
            return Err(EtlError::config(format!(
                "DB_SERVER '{}' cannot carry credentials",
                server
            )));
        }
        url.set_path(&self.database);
        Ok(Some(url.to_string()))
    }

    /// Human readable target without credentials
    pub fn describe(&self) -> String {
        match self.driver {
            DatabaseDriver::Memory => "in-memory warehouse".to_string(),
            DatabaseDriver::Sql(dialect) => match &self.server {
                Some(server) => format!("{} database '{}' on {}", dialect, self.database, server),
                None => format!("{} database '{}'", dialect, self.database),
            },
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("server", &self.server)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub connection_string: String,
    pub container: String,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("connection_string", &"********")
            .field("container", &self.container)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub sources: SourcePaths,
    pub batch_size: usize,
}

impl PipelineConfig {
    /// Load configuration from the process environment
    ///
    /// Call `dotenvy` first to source a `.env` file.
    ///
    /// # Errors
    /// Returns a `Config` error listing every missing or malformed variable
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut problems = Vec::new();
        let require = |key: &str, problems: &mut Vec<String>| {
            let value = get(key);
            if value.is_none() {
                problems.push(format!("{} is not set", key));
            }
            value.unwrap_or_default()
        };

        let connection_string = require("STORAGE_CONNECTION_STRING", &mut problems);
        let container = require("CONTAINER_NAME", &mut problems);
        let driver_name = require("DB_DRIVER", &mut problems);

        let driver = match driver_name.to_lowercase().as_str() {
            "" => None,
            "memory" => Some(DatabaseDriver::Memory),
            other => match other.parse::<Dialect>() {
                Ok(dialect) => Some(DatabaseDriver::Sql(dialect)),
                Err(reason) => {
                    problems.push(format!("DB_DRIVER: {}", reason));
                    None
                }
            },
        };

        let needs_database = !matches!(driver, Some(DatabaseDriver::Memory));
        let networked = matches!(driver, Some(DatabaseDriver::Sql(d)) if d.is_networked());

        let database = if needs_database {
            require("DB_DATABASE", &mut problems)
        } else {
            get("DB_DATABASE").unwrap_or_default()
        };
        let (server, username, password) = if networked {
            (
                Some(require("DB_SERVER", &mut problems)),
                Some(require("DB_USERNAME", &mut problems)),
                Some(require("DB_PASSWORD", &mut problems)),
            )
        } else {
            (get("DB_SERVER"), get("DB_USERNAME"), get("DB_PASSWORD"))
        };

        let port = match get("DB_PORT").map(|p| p.parse::<u16>()) {
            None => None,
            Some(Ok(port)) => Some(port),
            Some(Err(_)) => {
                problems.push("DB_PORT must be a port number".to_string());
                None
            }
        };

        let batch_size = match get("LOAD_BATCH_SIZE").map(|b| b.parse::<usize>()) {
            None => DEFAULT_BATCH_SIZE,
            Some(Ok(size)) if size > 0 => size,
            Some(_) => {
                problems.push("LOAD_BATCH_SIZE must be a positive integer".to_string());
                DEFAULT_BATCH_SIZE
            }
        };

        let defaults = SourcePaths::default();
        let sources = SourcePaths {
            transactions: get("TRANSACTIONS_PATH").unwrap_or(defaults.transactions),
            products: get("PRODUCTS_PATH").unwrap_or(defaults.products),
            customers: get("CUSTOMERS_PATH").unwrap_or(defaults.customers),
        };

        match driver {
            Some(driver) if problems.is_empty() => Ok(Self {
                storage: StorageConfig {
                    connection_string,
                    container,
                },
                database: DatabaseConfig {
                    driver,
                    server,
                    port,
                    database,
                    username,
                    password,
                },
                sources,
                batch_size,
            }),
            _ => Err(EtlError::Config { problems }),
        }
    }

    /// Open the configured source container
    pub fn extractor(&self) -> Result<BlobStore> {
        BlobStore::from_connection_string(&self.storage.connection_string, &self.storage.container)
    }

    /// Prepare the configured warehouse; SQL connections open on first load
    pub fn loader(&self) -> Result<Warehouse> {
        let db = &self.database;
        match (db.driver, db.url()?) {
            (DatabaseDriver::Sql(Dialect::MsSql), _) => Ok(Warehouse::MsSql(
                MsSqlWarehouse::new(
                    db.server.as_deref().unwrap_or_default(),
                    db.port,
                    &db.database,
                    db.username.as_deref().unwrap_or_default(),
                    db.password.as_deref().unwrap_or_default(),
                )
                .with_batch_size(self.batch_size),
            )),
            (DatabaseDriver::Sql(dialect), Some(url)) => Ok(Warehouse::Sql(
                SqlWarehouse::connect_lazy(&url, dialect)?.with_batch_size(self.batch_size),
            )),
            _ => Ok(Warehouse::Memory(MemoryWarehouse::new())),
        }
    }
}
