//! Object storage extractor
//!
//! Reads source files from Azure Blob Storage, a local directory or an
//! in-memory store through `object_store`, and parses them by extension.

use super::SourceFormat;
use crate::error::{EtlError, Result};
use crate::etl::Extractor;
use crate::model::Dataset;
use object_store::azure::MicrosoftAzureBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::{ObjectStore, PutPayload};
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Extractor over a single storage container
///
/// # Example
/// ```no_run
/// use retail_star_etl::etl::Extractor;
/// use retail_star_etl::storage::BlobStore;
///
/// # async fn example() -> retail_star_etl::error::Result<()> {
/// let store = BlobStore::from_connection_string(
///     "DefaultEndpointsProtocol=https;AccountName=retail;AccountKey=c2VjcmV0;EndpointSuffix=core.windows.net",
///     "raw",
/// )?;
/// let products = store.extract("products/2024/1/15/product_catalog.json").await?;
/// println!("{} products", products.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BlobStore {
    store: Arc<dyn ObjectStore>,
    container: String,
}

impl BlobStore {
    pub fn new(store: Arc<dyn ObjectStore>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
        }
    }

    /// An empty in-memory container
    pub fn in_memory(container: impl Into<String>) -> Self {
        Self::new(Arc::new(InMemory::new()), container)
    }

    /// Build a store from a connection string
    ///
    /// Accepted forms:
    /// - `file:///some/dir`: local directory, `container` is a sub directory
    /// - `memory://`: empty in-memory store
    /// - Azure storage connection strings (`AccountName=..;AccountKey=..`,
    ///   `BlobEndpoint=..;SharedAccessSignature=..`,
    ///   `UseDevelopmentStorage=true`)
    ///
    /// # Errors
    /// Returns a `Config` error if the connection string is not usable
    pub fn from_connection_string(connection_string: &str, container: &str) -> Result<Self> {
        let connection_string = connection_string.trim();

        if connection_string.starts_with("memory://") {
            log::debug!("Using in-memory storage for container '{}'", container);
            return Ok(Self::in_memory(container));
        }

        if connection_string.starts_with("file://") {
            let url = Url::parse(connection_string)
                .map_err(|e| EtlError::config(format!("invalid storage URL: {}", e)))?;
            let root = url
                .to_file_path()
                .map_err(|_| EtlError::config("storage URL is not a local path"))?;
            let store = LocalFileSystem::new_with_prefix(root.join(container)).map_err(|e| {
                EtlError::config(format!("cannot open container '{}': {}", container, e))
            })?;
            log::debug!("Using local storage at {}", root.join(container).display());
            return Ok(Self::new(Arc::new(store), container));
        }

        let store = azure_store(connection_string, container)?;
        Ok(Self::new(Arc::new(store), container))
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Write raw bytes to `path`, mainly to seed test and demo containers
    pub async fn put(&self, path: &str, content: impl Into<String>) -> Result<()> {
        let location = parse_path(path)?;
        self.store
            .put(&location, PutPayload::from(content.into().into_bytes()))
            .await
            .map_err(|e| EtlError::fetch_failed(path, e))?;
        Ok(())
    }

    async fn read_text(&self, source_id: &str) -> Result<String> {
        let location = parse_path(source_id)?;
        let bytes = self
            .store
            .get(&location)
            .await
            .map_err(|e| EtlError::fetch_failed(source_id, e))?
            .bytes()
            .await
            .map_err(|e| EtlError::fetch_failed(source_id, e))?;

        String::from_utf8(bytes.to_vec()).map_err(|e| EtlError::fetch_failed(source_id, e))
    }
}

impl Extractor for BlobStore {
    async fn extract(&self, source_id: &str) -> Result<Dataset> {
        let Some(format) = SourceFormat::from_path(source_id) else {
            log::warn!("Unsupported file format for {}", source_id);
            return Err(EtlError::UnsupportedFormat {
                source_id: source_id.to_string(),
            });
        };

        log::debug!("Reading {} from container '{}'", source_id, self.container);
        let text = self.read_text(source_id).await?;

        let dataset = format
            .parse(source_id, &text)
            .map_err(|e| EtlError::fetch_failed(source_id, e))?;

        log::debug!(
            "Parsed {} row(s) x {} column(s) from {}",
            dataset.len(),
            dataset.columns().len(),
            source_id
        );
        Ok(dataset)
    }
}

fn parse_path(path: &str) -> Result<ObjectPath> {
    ObjectPath::parse(path).map_err(|e| EtlError::fetch_failed(path, e))
}

/// Split `Key=Value;Key=Value` into a case-insensitive lookup
///
/// Values may contain `=` (base64 account keys, SAS signatures).
fn connection_settings(connection_string: &str) -> HashMap<String, String> {
    connection_string
        .split(';')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
        .collect()
}

fn azure_store(connection_string: &str, container: &str) -> Result<impl ObjectStore> {
    let settings = connection_settings(connection_string);
    let get = |key: &str| settings.get(key).filter(|v| !v.is_empty());

    let mut builder = MicrosoftAzureBuilder::new().with_container_name(container);

    if get("usedevelopmentstorage").is_some_and(|v| v.eq_ignore_ascii_case("true")) {
        builder = builder.with_use_emulator(true);
    } else {
        let endpoint = get("blobendpoint")
            .map(|e| Url::parse(e))
            .transpose()
            .map_err(|e| EtlError::config(format!("invalid BlobEndpoint: {}", e)))?;
        let account = match (get("accountname"), &endpoint) {
            (Some(account), _) => account.clone(),
            (None, Some(url)) => endpoint_account(url).ok_or_else(|| {
                EtlError::config(format!(
                    "cannot tell the storage account from BlobEndpoint '{}'; set AccountName",
                    url
                ))
            })?,
            (None, None) => {
                return Err(EtlError::config(
                    "storage connection string needs AccountName or BlobEndpoint",
                ));
            }
        };

        let protocol = get("defaultendpointsprotocol").map_or("https", |p| p.as_str());
        if protocol.eq_ignore_ascii_case("http") {
            builder = builder.with_allow_http(true);
        }

        if let Some(url) = &endpoint {
            if url.scheme() == "http" {
                builder = builder.with_allow_http(true);
            }
            builder = builder.with_endpoint(url.as_str().trim_end_matches('/').to_string());
        } else if let Some(suffix) = get("endpointsuffix") {
            builder = builder.with_endpoint(format!("{}://{}.blob.{}", protocol, account, suffix));
        }
        builder = builder.with_account(account);

        if let Some(key) = get("accountkey") {
            builder = builder.with_access_key(key);
        }
        if let Some(sas) = get("sharedaccesssignature") {
            builder = builder.with_sas_authorization(sas_pairs(sas));
        }
    }

    builder
        .build()
        .map_err(|e| EtlError::config(format!("cannot configure blob storage: {}", e)))
}

/// Account name implied by a blob endpoint
///
/// `https://acct.blob.core.windows.net` names it in the first host label;
/// emulator endpoints such as `http://127.0.0.1:10000/devstoreaccount1` in
/// the first path segment.
fn endpoint_account(endpoint: &Url) -> Option<String> {
    let account = match endpoint.host()? {
        url::Host::Domain(domain) if domain != "localhost" => domain.split('.').next(),
        _ => endpoint.path_segments()?.next(),
    };
    account.filter(|a| !a.is_empty()).map(str::to_string)
}

/// Split a SAS token into query pairs with values percent-decoded
///
/// `object_store` encodes the pairs again when signing requests.
fn sas_pairs(sas: &str) -> Vec<(String, String)> {
    sas.trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .map(|(key, value)| {
            let decoded = percent_encoding::percent_decode_str(value)
                .decode_utf8()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            (key.to_string(), decoded)
        })
        .collect()
}
