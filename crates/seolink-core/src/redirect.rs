use crate::error::{RedirectError, Result};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use typed_builder::TypedBuilder;

const MAX_ID_LENGTH: usize = 128;

/// Identifier of a stored redirect configuration.
///
/// Ids are opaque to callers. They are produced by the repository's id
/// generator and are restricted to ASCII letters, digits, `-` and `_`, so
/// the same id keys the same record in every store and never needs escaping
/// in a URL path.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RedirectId(String);

impl RedirectId {
    /// Parses an id received from an untrusted source (e.g. a request path).
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() || value.len() > MAX_ID_LENGTH {
            return Err(RedirectError::validation(
                "id",
                format!(
                    "length must be between 1 and {}, got {}",
                    MAX_ID_LENGTH,
                    value.len()
                ),
            ));
        }
        if let Some(c) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(RedirectError::validation(
                "id",
                format!("unexpected character {:?} in '{}'", c, value),
            ));
        }
        Ok(Self(value))
    }

    /// Creates an id without validation.
    ///
    /// Use this only for ids produced by trusted internal sources such as
    /// id generators or records read back from storage.
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RedirectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of the user owning a record in multi-tenant deployments.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnerId(String);

impl OwnerId {
    pub fn new(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(RedirectError::validation("ownerId", "must not be empty"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Open Graph page type shown on the landing page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PageType {
    #[default]
    Website,
    Product,
    Article,
    Service,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageType::Website => "website",
            PageType::Product => "product",
            PageType::Article => "article",
            PageType::Service => "service",
        }
    }
}

impl Display for PageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PageType {
    type Err = RedirectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "website" => Ok(PageType::Website),
            "product" => Ok(PageType::Product),
            "article" => Ok(PageType::Article),
            "service" => Ok(PageType::Service),
            other => Err(RedirectError::validation(
                "type",
                format!("expected website, product, article or service, got '{}'", other),
            )),
        }
    }
}

/// A stored redirect configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectConfig {
    pub id: RedirectId,
    pub title: String,
    pub description: String,
    pub target_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub page_type: Option<PageType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<OwnerId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields supplied by a client when creating a redirect.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct NewRedirect {
    #[builder(setter(into))]
    pub title: String,
    #[builder(setter(into))]
    pub description: String,
    #[builder(setter(into))]
    pub target_url: String,
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub image: Option<String>,
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub keywords: Option<String>,
    #[serde(default)]
    #[builder(default, setter(strip_option, into))]
    pub site_name: Option<String>,
    #[serde(rename = "type", default)]
    #[builder(default, setter(strip_option))]
    pub page_type: Option<PageType>,
}

impl NewRedirect {
    /// Checks the required fields without touching storage.
    pub fn validate(&self) -> Result<()> {
        validate_required("title", &self.title)?;
        validate_required("description", &self.description)?;
        validate_target_url(&self.target_url)
    }

    /// Builds the record to persist. Optional fields left empty are dropped
    /// and the page type defaults to [`PageType::Website`].
    pub fn into_record(
        self,
        id: RedirectId,
        owner_id: Option<OwnerId>,
        now: Timestamp,
    ) -> RedirectConfig {
        RedirectConfig {
            id,
            title: self.title.trim().to_owned(),
            description: self.description.trim().to_owned(),
            target_url: self.target_url.trim().to_owned(),
            image: normalize_optional(self.image),
            keywords: normalize_optional(self.keywords),
            site_name: normalize_optional(self.site_name),
            page_type: Some(self.page_type.unwrap_or_default()),
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A partial update.
///
/// Absent fields keep their stored value. For the optional string fields a
/// present but empty value clears the stored value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedirectPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub target_url: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(rename = "type", default)]
    pub page_type: Option<PageType>,
}

impl RedirectPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(title) = &self.title {
            validate_required("title", title)?;
        }
        if let Some(description) = &self.description {
            validate_required("description", description)?;
        }
        if let Some(target_url) = &self.target_url {
            validate_target_url(target_url)?;
        }
        Ok(())
    }

    /// Merges the present fields into `record` and stamps `updated_at`.
    ///
    /// `updated_at` never moves before `created_at`.
    pub fn apply_to(&self, record: &mut RedirectConfig, updated_at: Timestamp) {
        if let Some(title) = &self.title {
            record.title = title.trim().to_owned();
        }
        if let Some(description) = &self.description {
            record.description = description.trim().to_owned();
        }
        if let Some(target_url) = &self.target_url {
            record.target_url = target_url.trim().to_owned();
        }
        if let Some(image) = &self.image {
            record.image = normalize_optional(Some(image.clone()));
        }
        if let Some(keywords) = &self.keywords {
            record.keywords = normalize_optional(Some(keywords.clone()));
        }
        if let Some(site_name) = &self.site_name {
            record.site_name = normalize_optional(Some(site_name.clone()));
        }
        if let Some(page_type) = self.page_type {
            record.page_type = Some(page_type);
        }
        record.updated_at = updated_at.max(record.created_at);
    }

    /// Serialized names of the fields this patch touches.
    pub fn field_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.title.is_some() {
            names.push("title");
        }
        if self.description.is_some() {
            names.push("description");
        }
        if self.target_url.is_some() {
            names.push("targetUrl");
        }
        if self.image.is_some() {
            names.push("image");
        }
        if self.keywords.is_some() {
            names.push("keywords");
        }
        if self.site_name.is_some() {
            names.push("siteName");
        }
        if self.page_type.is_some() {
            names.push("type");
        }
        names
    }
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn validate_required(field: &'static str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(RedirectError::validation(field, "must not be empty"));
    }
    Ok(())
}

/// Target URLs must be absolute http(s) URLs with a host.
fn validate_target_url(value: &str) -> Result<()> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RedirectError::validation("targetUrl", "must not be empty"));
    }

    let parsed = url::Url::parse(value)
        .map_err(|e| RedirectError::validation("targetUrl", format!("'{}': {}", value, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(RedirectError::validation(
            "targetUrl",
            format!("scheme must be http or https, got '{}'", parsed.scheme()),
        ));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(RedirectError::validation(
            "targetUrl",
            format!("'{}' has no host", value),
        ));
    }
    Ok(())
}
