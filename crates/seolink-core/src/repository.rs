use crate::error::Result;
use crate::public_url::build_public_url;
use crate::redirect::{NewRedirect, RedirectConfig, RedirectId, RedirectPatch};
use crate::scope::Scope;
use async_trait::async_trait;
use serde::Serialize;

/// Health of the storage backend as observed by a read.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum StorageStatus {
    Connected,
    /// The read could not reach storage and an empty result was returned.
    Degraded { reason: String },
}

/// Result of [`RedirectRepository::list_all`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectListing {
    pub redirects: Vec<RedirectConfig>,
    pub status: StorageStatus,
}

impl RedirectListing {
    pub fn connected(redirects: Vec<RedirectConfig>) -> Self {
        Self {
            redirects,
            status: StorageStatus::Connected,
        }
    }

    pub fn degraded(reason: impl Into<String>) -> Self {
        Self {
            redirects: Vec::new(),
            status: StorageStatus::Degraded {
                reason: reason.into(),
            },
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self.status, StorageStatus::Degraded { .. })
    }
}

/// Domain-level CRUD over redirect configurations.
///
/// Reads never fail because storage is down: they degrade to an empty
/// result. Writes surface every failure.
#[async_trait]
pub trait RedirectRepository: Send + Sync + 'static {
    /// Lists every record visible in `scope`, newest first.
    async fn list_all(&self, scope: &Scope) -> RedirectListing;

    /// Returns `None` if the record does not exist or is not visible in `scope`.
    async fn get_by_id(&self, id: &RedirectId, scope: &Scope) -> Option<RedirectConfig>;

    /// Validates and persists a new record.
    async fn create(&self, fields: NewRedirect, scope: &Scope) -> Result<RedirectConfig>;

    /// Merges `patch` into an existing record.
    ///
    /// Returns `Err(NotFound)` if the id does not exist and
    /// `Err(Unauthorized)` if it belongs to another owner.
    async fn update(
        &self,
        id: &RedirectId,
        patch: RedirectPatch,
        scope: &Scope,
    ) -> Result<RedirectConfig>;

    /// Deletes a record. Returns `true` if the record existed and was removed.
    async fn delete(&self, id: &RedirectId, scope: &Scope) -> Result<bool>;

    /// Builds the public landing URL for a stored record.
    async fn public_url(&self, base_url: &str, id: &RedirectId, scope: &Scope) -> Option<String> {
        self.get_by_id(id, scope)
            .await
            .map(|config| build_public_url(base_url, &config))
    }
}
