//! Error taxonomy for the retail ETL pipeline
//!
//! Each stage fails with its own variant so the pipeline can apply the
//! right propagation policy: extraction and transform errors abort the run,
//! load errors are collected per table.

use thiserror::Error;

/// Boxed cause carried by storage and sink failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T> = std::result::Result<T, EtlError>;

#[derive(Debug, Error)]
pub enum EtlError {
    /// Required configuration is missing or malformed
    #[error("invalid configuration: {}", .problems.join("; "))]
    Config { problems: Vec<String> },

    /// Storage connectivity, authentication, decoding or parse failure
    #[error("failed to fetch '{source_id}': {cause}")]
    FetchFailed {
        source_id: String,
        #[source]
        cause: BoxError,
    },

    /// The source extension has no parser
    #[error("unsupported file format for '{source_id}'")]
    UnsupportedFormat { source_id: String },

    /// A dataset is empty or lacks a required column
    #[error("schema mismatch in {dataset}: {reason}")]
    SchemaMismatch { dataset: String, reason: String },

    /// A value could not be coerced to its required type
    #[error("data quality error in {dataset} row {row}: {reason}")]
    DataQuality {
        dataset: String,
        row: usize,
        reason: String,
    },

    /// Writing a table to the warehouse failed
    #[error("failed to load table '{table}': {cause}")]
    LoadFailed {
        table: String,
        #[source]
        cause: BoxError,
    },
}

impl EtlError {
    pub fn config(problem: impl Into<String>) -> Self {
        Self::Config {
            problems: vec![problem.into()],
        }
    }

    pub fn fetch_failed(source_id: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::FetchFailed {
            source_id: source_id.into(),
            cause: cause.into(),
        }
    }

    pub fn schema_mismatch(dataset: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SchemaMismatch {
            dataset: dataset.into(),
            reason: reason.into(),
        }
    }

    pub fn data_quality(dataset: impl Into<String>, row: usize, reason: impl Into<String>) -> Self {
        Self::DataQuality {
            dataset: dataset.into(),
            row,
            reason: reason.into(),
        }
    }

    pub fn load_failed(table: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self::LoadFailed {
            table: table.into(),
            cause: cause.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_lists_every_problem() {
        let err = EtlError::Config {
            problems: vec!["DB_SERVER is not set".into(), "DB_DRIVER is not set".into()],
        };
        assert_eq!(
            err.to_string(),
            "invalid configuration: DB_SERVER is not set; DB_DRIVER is not set"
        );
    }

    #[test]
    fn test_fetch_failed_keeps_source() {
        let err = EtlError::fetch_failed("products.json", "connection refused");
        assert!(err.to_string().contains("products.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
