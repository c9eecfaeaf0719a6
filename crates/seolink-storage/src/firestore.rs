//! Firestore REST adapter.
//!
//! Each redirect is one document in a collection (default `redirects`),
//! named by its id. The owner is a stored `ownerId` field that listing
//! queries filter on server-side.
//!
//! An equality filter on `ownerId` combined with an order on `createdAt`
//! needs a composite index. Until one is deployed Firestore rejects the
//! query with `FAILED_PRECONDITION`, which this adapter reports as
//! [`StorageError::IndexUnavailable`].

use crate::http::{ensure_success, map_reqwest_error, read_json, status_error};
use async_trait::async_trait;
use jiff::Timestamp;
use reqwest::{IntoUrl, Method, RequestBuilder, StatusCode, Url};
use seolink_core::error::{StorageError, StorageResult};
use seolink_core::redirect::{OwnerId, PageType, RedirectConfig, RedirectId, RedirectPatch};
use seolink_core::store::{ListOrder, ListQuery, RedirectStore};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::{debug, trace, warn};
use typed_builder::TypedBuilder;

pub const DEFAULT_API_BASE: &str = "https://firestore.googleapis.com/v1";
pub const DEFAULT_DATABASE: &str = "(default)";
pub const DEFAULT_COLLECTION: &str = "redirects";

/// Connection settings for a Firestore database.
#[derive(Debug, Clone, TypedBuilder)]
pub struct FirestoreConfig {
    #[builder(default = DEFAULT_API_BASE.to_string(), setter(into))]
    pub api_base: String,
    #[builder(default, setter(into))]
    pub project_id: Option<String>,
    #[builder(default, setter(into))]
    pub api_key: Option<String>,
    /// ID token of the signed-in user, forwarded so security rules apply.
    #[builder(default, setter(into))]
    pub bearer_token: Option<String>,
    #[builder(default = DEFAULT_DATABASE.to_string(), setter(into))]
    pub database: String,
    #[builder(default = DEFAULT_COLLECTION.to_string(), setter(into))]
    pub collection: String,
}

/// A typed Firestore value. Only the kinds this collection stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum Value {
    StringValue(String),
    TimestampValue(Timestamp),
    NullValue(()),
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Document {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

/// A [`RedirectStore`] backed by the Firestore REST API.
#[derive(Debug, Clone)]
pub struct FirestoreStore {
    client: reqwest::Client,
    config: FirestoreConfig,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    pub fn with_client(client: reqwest::Client, config: FirestoreConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &FirestoreConfig {
        &self.config
    }

    fn project_id(&self) -> StorageResult<&str> {
        non_empty(self.config.project_id.as_deref()).ok_or_else(|| {
            StorageError::Unavailable("Firestore project id not configured".to_string())
        })
    }

    fn api_key(&self) -> StorageResult<&str> {
        non_empty(self.config.api_key.as_deref())
            .ok_or_else(|| StorageError::Unavailable("Firestore API key not configured".to_string()))
    }

    fn documents_url(&self) -> StorageResult<String> {
        Ok(format!(
            "{}/projects/{}/databases/{}/documents",
            self.config.api_base.trim_end_matches('/'),
            self.project_id()?,
            self.config.database
        ))
    }

    fn collection_url(&self) -> StorageResult<String> {
        Ok(format!("{}/{}", self.documents_url()?, self.config.collection))
    }

    /// The id is pushed as one encoded path segment, so reserved characters
    /// can never address another document.
    fn document_url(&self, id: &RedirectId) -> StorageResult<Url> {
        let mut url = Url::parse(&self.collection_url()?)
            .map_err(|e| StorageError::Unavailable(format!("invalid Firestore API base: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| StorageError::Unavailable("Firestore API base has no path".to_string()))?
            .push(id.as_str());
        Ok(url)
    }

    fn request(&self, method: Method, url: impl IntoUrl) -> StorageResult<RequestBuilder> {
        let mut request = self
            .client
            .request(method, url)
            .query(&[("key", self.api_key()?)]);
        if let Some(token) = non_empty(self.config.bearer_token.as_deref()) {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn send(&self, request: RequestBuilder) -> StorageResult<reqwest::Response> {
        request.send().await.map_err(map_reqwest_error)
    }

    fn structured_query(&self, query: &ListQuery) -> serde_json::Value {
        let mut structured = json!({
            "from": [{ "collectionId": self.config.collection }],
        });
        if let Some(owner) = query.scope.owner() {
            structured["where"] = json!({
                "fieldFilter": {
                    "field": { "fieldPath": "ownerId" },
                    "op": "EQUAL",
                    "value": { "stringValue": owner.as_str() },
                }
            });
        }
        if query.order == ListOrder::NewestFirst {
            structured["orderBy"] = json!([{
                "field": { "fieldPath": "createdAt" },
                "direction": "DESCENDING",
            }]);
        }
        json!({ "structuredQuery": structured })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn is_missing_index(status: StatusCode, body: &str) -> bool {
    status == StatusCode::BAD_REQUEST
        && body.contains("FAILED_PRECONDITION")
        && body.to_ascii_lowercase().contains("index")
}

fn record_fields(record: &RedirectConfig) -> BTreeMap<String, Value> {
    let mut fields = BTreeMap::new();
    let mut put = |key: &str, value: Value| {
        fields.insert(key.to_string(), value);
    };

    put("title", Value::StringValue(record.title.clone()));
    put("description", Value::StringValue(record.description.clone()));
    put("targetUrl", Value::StringValue(record.target_url.clone()));
    if let Some(image) = &record.image {
        put("image", Value::StringValue(image.clone()));
    }
    if let Some(keywords) = &record.keywords {
        put("keywords", Value::StringValue(keywords.clone()));
    }
    if let Some(site_name) = &record.site_name {
        put("siteName", Value::StringValue(site_name.clone()));
    }
    if let Some(page_type) = record.page_type {
        put("type", Value::StringValue(page_type.as_str().to_string()));
    }
    if let Some(owner_id) = &record.owner_id {
        put("ownerId", Value::StringValue(owner_id.as_str().to_string()));
    }
    put("createdAt", Value::TimestampValue(record.created_at));
    put("updatedAt", Value::TimestampValue(record.updated_at));
    fields
}

/// Fields and update mask for a PATCH. Masked fields missing from the body
/// are deleted by Firestore, which is how cleared optional fields are sent.
fn patch_fields(
    patch: &RedirectPatch,
    updated_at: Timestamp,
) -> (BTreeMap<String, Value>, Vec<&'static str>) {
    let mut fields = BTreeMap::new();
    let present = [
        ("title", patch.title.as_deref()),
        ("description", patch.description.as_deref()),
        ("targetUrl", patch.target_url.as_deref()),
        ("image", patch.image.as_deref()),
        ("keywords", patch.keywords.as_deref()),
        ("siteName", patch.site_name.as_deref()),
        ("type", patch.page_type.as_ref().map(PageType::as_str)),
    ];
    for (key, value) in present {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            fields.insert(key.to_string(), Value::StringValue(value.to_string()));
        }
    }
    fields.insert("updatedAt".to_string(), Value::TimestampValue(updated_at));

    let mut mask = patch.field_names();
    mask.push("updatedAt");
    (fields, mask)
}

fn optional_string(fields: &BTreeMap<String, Value>, key: &str) -> StorageResult<Option<String>> {
    match fields.get(key) {
        None | Some(Value::NullValue(())) => Ok(None),
        Some(Value::StringValue(value)) => Ok(Some(value.clone())),
        Some(other) => Err(StorageError::InvalidData(format!(
            "field '{}' has unexpected value {:?}",
            key, other
        ))),
    }
}

fn required_string(fields: &BTreeMap<String, Value>, key: &str) -> StorageResult<String> {
    optional_string(fields, key)?
        .ok_or_else(|| StorageError::InvalidData(format!("missing field '{}'", key)))
}

fn timestamp(fields: &BTreeMap<String, Value>, key: &str) -> StorageResult<Timestamp> {
    match fields.get(key) {
        Some(Value::TimestampValue(ts)) => Ok(*ts),
        Some(Value::StringValue(raw)) => raw.parse().map_err(|e| {
            StorageError::InvalidData(format!("field '{}' is not a timestamp: {}", key, e))
        }),
        _ => Err(StorageError::InvalidData(format!("missing field '{}'", key))),
    }
}

fn into_record(document: Document) -> StorageResult<RedirectConfig> {
    let name = document
        .name
        .ok_or_else(|| StorageError::InvalidData("document without a name".to_string()))?;
    let id = name
        .rsplit('/')
        .next()
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StorageError::InvalidData(format!("malformed document name '{}'", name)))?;
    let fields = &document.fields;

    let page_type = optional_string(fields, "type")?
        .map(|raw| {
            raw.parse::<PageType>()
                .map_err(|e| StorageError::InvalidData(e.to_string()))
        })
        .transpose()?;
    let owner_id = optional_string(fields, "ownerId")?
        .map(|raw| OwnerId::new(raw).map_err(|e| StorageError::InvalidData(e.to_string())))
        .transpose()?;

    Ok(RedirectConfig {
        id: RedirectId::new_unchecked(id),
        title: required_string(fields, "title")?,
        description: required_string(fields, "description")?,
        target_url: required_string(fields, "targetUrl")?,
        image: optional_string(fields, "image")?,
        keywords: optional_string(fields, "keywords")?,
        site_name: optional_string(fields, "siteName")?,
        page_type,
        owner_id,
        created_at: timestamp(fields, "createdAt")?,
        updated_at: timestamp(fields, "updatedAt")?,
    })
}

#[async_trait]
impl RedirectStore for FirestoreStore {
    fn is_available(&self) -> bool {
        self.project_id().is_ok() && self.api_key().is_ok()
    }

    async fn read_all(&self, query: &ListQuery) -> StorageResult<Vec<RedirectConfig>> {
        let url = format!("{}:runQuery", self.documents_url()?);
        trace!(?query, "running Firestore query");

        let request = self
            .request(Method::POST, &url)?
            .json(&self.structured_query(query));
        let response = self.send(request).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            if is_missing_index(status, &body) {
                debug!(?query, "Firestore query needs a composite index");
                return Err(StorageError::IndexUnavailable(
                    "query requires a composite index".to_string(),
                ));
            }
            warn!(status = status.as_u16(), "Firestore query failed");
            return Err(status_error(status, &body));
        }

        let items: Vec<RunQueryItem> = read_json(response).await?;
        items
            .into_iter()
            .filter_map(|item| item.document)
            .map(into_record)
            .collect()
    }

    async fn read_one(&self, id: &RedirectId) -> StorageResult<Option<RedirectConfig>> {
        let request = self.request(Method::GET, self.document_url(id)?)?;
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let document: Document = read_json(response).await?;
        into_record(document).map(Some)
    }

    async fn write_one(&self, record: RedirectConfig) -> StorageResult<RedirectConfig> {
        let body = Document {
            name: None,
            fields: record_fields(&record),
        };
        let request = self
            .request(Method::POST, &self.collection_url()?)?
            .query(&[("documentId", record.id.as_str())])
            .json(&body);
        let response = self.send(request).await?;
        if response.status() == StatusCode::CONFLICT {
            return Err(StorageError::Conflict(record.id.to_string()));
        }

        let response = ensure_success(response).await?;
        let document: Document = read_json(response).await?;
        debug!(id = %record.id, "created Firestore document");
        into_record(document)
    }

    async fn update_one(
        &self,
        id: &RedirectId,
        patch: &RedirectPatch,
        updated_at: Timestamp,
    ) -> StorageResult<Option<RedirectConfig>> {
        let (fields, mask) = patch_fields(patch, updated_at);
        let mut params: Vec<(&str, &str)> = mask
            .into_iter()
            .map(|field| ("updateMask.fieldPaths", field))
            .collect();
        params.push(("currentDocument.exists", "true"));

        let body = Document { name: None, fields };
        let request = self
            .request(Method::PATCH, self.document_url(id)?)?
            .query(&params)
            .json(&body);
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let document: Document = read_json(response).await?;
        into_record(document).map(Some)
    }

    async fn delete_one(&self, id: &RedirectId) -> StorageResult<bool> {
        let request = self
            .request(Method::DELETE, self.document_url(id)?)?
            .query(&[("currentDocument.exists", "true")]);
        let response = self.send(request).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        ensure_success(response).await?;
        Ok(true)
    }
}
