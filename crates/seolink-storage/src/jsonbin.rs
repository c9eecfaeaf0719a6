use crate::blob::{BlobBackend, BlobDocument};
use crate::http::{ensure_success, map_reqwest_error, read_json};
use async_trait::async_trait;
use jiff::Timestamp;
use seolink_core::error::{StorageError, StorageResult};
use serde::Deserialize;
use tracing::{debug, info, trace};
use typed_builder::TypedBuilder;

pub const DEFAULT_API_BASE: &str = "https://api.jsonbin.io/v3";
pub const DEFAULT_BIN_NAME: &str = "seo-redirects-data";

const MASTER_KEY_HEADER: &str = "X-Master-Key";
const BIN_NAME_HEADER: &str = "X-Bin-Name";

/// Connection settings for a JSONBin bin.
#[derive(Debug, Clone, TypedBuilder)]
pub struct JsonBinConfig {
    /// Base URL of the JSONBin v3 API.
    #[builder(default = DEFAULT_API_BASE.to_string(), setter(into))]
    pub api_base: String,
    #[builder(default, setter(into))]
    pub api_key: Option<String>,
    #[builder(default, setter(into))]
    pub bin_id: Option<String>,
}

#[derive(Deserialize)]
struct LatestResponse {
    record: BlobDocument,
}

#[derive(Deserialize)]
struct CreateResponse {
    metadata: CreateMetadata,
}

#[derive(Deserialize)]
struct CreateMetadata {
    id: String,
}

/// A [`BlobBackend`] storing the collection in a JSONBin bin.
///
/// Without an API key and bin id the client stays constructible but
/// reports itself unconfigured, and every call fails with
/// [`StorageError::Unavailable`] before any network I/O.
#[derive(Debug, Clone)]
pub struct JsonBinClient {
    client: reqwest::Client,
    config: JsonBinConfig,
}

impl JsonBinClient {
    pub fn new(config: JsonBinConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: JsonBinConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &JsonBinConfig {
        &self.config
    }

    fn api_base(&self) -> &str {
        self.config.api_base.trim_end_matches('/')
    }

    fn api_key(&self) -> StorageResult<&str> {
        non_empty(self.config.api_key.as_deref())
            .ok_or_else(|| StorageError::Unavailable("JSONBin API key not configured".to_string()))
    }

    fn credentials(&self) -> StorageResult<(&str, &str)> {
        let api_key = self.api_key()?;
        let bin_id = non_empty(self.config.bin_id.as_deref())
            .ok_or_else(|| StorageError::Unavailable("JSONBin bin id not configured".to_string()))?;
        Ok((api_key, bin_id))
    }

    /// Creates a new bin holding an empty collection and returns its id.
    ///
    /// Only the API key is required. The returned id is what the
    /// `bin_id` setting expects.
    pub async fn create_bin(&self, name: &str) -> StorageResult<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/b", self.api_base());
        let initial = BlobDocument {
            redirects: Vec::new(),
            last_updated: Some(Timestamp::now()),
        };

        let response = self
            .client
            .post(&url)
            .header(MASTER_KEY_HEADER, api_key)
            .header(BIN_NAME_HEADER, name)
            .json(&initial)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let created: CreateResponse = read_json(response).await?;

        info!(bin_id = %created.metadata.id, name, "created JSONBin bin");
        Ok(created.metadata.id)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait]
impl BlobBackend for JsonBinClient {
    fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    async fn load(&self) -> StorageResult<BlobDocument> {
        let (api_key, bin_id) = self.credentials()?;
        let url = format!("{}/b/{}/latest", self.api_base(), bin_id);
        trace!(%url, "loading redirect blob");

        let response = self
            .client
            .get(&url)
            .header(MASTER_KEY_HEADER, api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = ensure_success(response).await?;
        let latest: LatestResponse = read_json(response).await?;

        debug!(count = latest.record.redirects.len(), "loaded redirect blob");
        Ok(latest.record)
    }

    async fn save(&self, document: &BlobDocument) -> StorageResult<()> {
        let (api_key, bin_id) = self.credentials()?;
        let url = format!("{}/b/{}", self.api_base(), bin_id);
        trace!(%url, count = document.redirects.len(), "saving redirect blob");

        let response = self
            .client
            .put(&url)
            .header(MASTER_KEY_HEADER, api_key)
            .json(document)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        ensure_success(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_to_public_api() {
        let config = JsonBinConfig::builder().build();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn configured_requires_key_and_bin() {
        let client = JsonBinClient::new(
            JsonBinConfig::builder()
                .api_key(Some("key".to_string()))
                .build(),
        );
        assert!(!client.is_configured());

        let client = JsonBinClient::new(
            JsonBinConfig::builder()
                .api_key(Some("key".to_string()))
                .bin_id(Some("  ".to_string()))
                .build(),
        );
        assert!(!client.is_configured());

        let client = JsonBinClient::new(
            JsonBinConfig::builder()
                .api_key(Some("key".to_string()))
                .bin_id(Some("bin".to_string()))
                .build(),
        );
        assert!(client.is_configured());
    }

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        // Unroutable base URL: any request attempt would error differently.
        let client = JsonBinClient::new(
            JsonBinConfig::builder()
                .api_base("http://invalid.invalid")
                .build(),
        );

        let err = client.load().await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(ref m) if m.contains("not configured")));

        let err = client.create_bin(DEFAULT_BIN_NAME).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(ref m) if m.contains("not configured")));
    }
}
