use async_trait::async_trait;
use jiff::Timestamp;
use parking_lot::Mutex;
use seolink_core::error::{StorageError, StorageResult};
use seolink_core::redirect::{RedirectConfig, RedirectId, RedirectPatch};
use seolink_core::store::{sort_newest_first, ListOrder, ListQuery, RedirectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// The single JSON document holding the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobDocument {
    #[serde(default)]
    pub redirects: Vec<RedirectConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<Timestamp>,
}

/// A remote location holding one [`BlobDocument`].
#[async_trait]
pub trait BlobBackend: Send + Sync + 'static {
    /// Whether credentials for the backend are present.
    fn is_configured(&self) -> bool;

    /// Reads the whole document.
    async fn load(&self) -> StorageResult<BlobDocument>;

    /// Replaces the whole document.
    async fn save(&self, document: &BlobDocument) -> StorageResult<()>;
}

enum Outcome<T> {
    Changed(T),
    Unchanged(T),
}

/// A [`RedirectStore`] that persists the collection as one blob.
///
/// Every mutation loads the blob, changes it in memory and writes it back.
/// Nothing guards the gap between load and save: two writers that overlap
/// both start from the same snapshot and the later save silently drops the
/// earlier one's change (last writer wins).
#[derive(Debug, Clone)]
pub struct BlobStore<B> {
    backend: B,
}

impl<B: BlobBackend> BlobStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn mutate<T, F>(&self, f: F) -> StorageResult<T>
    where
        T: Send,
        F: FnOnce(&mut Vec<RedirectConfig>) -> StorageResult<Outcome<T>> + Send,
    {
        let mut document = self.backend.load().await?;
        match f(&mut document.redirects)? {
            Outcome::Unchanged(value) => Ok(value),
            Outcome::Changed(value) => {
                document.last_updated = Some(Timestamp::now());
                self.backend.save(&document).await?;
                debug!(count = document.redirects.len(), "rewrote redirect blob");
                Ok(value)
            }
        }
    }
}

#[async_trait]
impl<B: BlobBackend> RedirectStore for BlobStore<B> {
    fn is_available(&self) -> bool {
        self.backend.is_configured()
    }

    async fn read_all(&self, query: &ListQuery) -> StorageResult<Vec<RedirectConfig>> {
        let document = self.backend.load().await?;
        let mut records: Vec<RedirectConfig> = document
            .redirects
            .into_iter()
            .filter(|record| query.scope.permits(record))
            .collect();

        if query.order == ListOrder::NewestFirst {
            sort_newest_first(&mut records);
        }

        trace!(count = records.len(), "read records from blob");
        Ok(records)
    }

    async fn read_one(&self, id: &RedirectId) -> StorageResult<Option<RedirectConfig>> {
        let document = self.backend.load().await?;
        Ok(document.redirects.into_iter().find(|record| &record.id == id))
    }

    async fn write_one(&self, record: RedirectConfig) -> StorageResult<RedirectConfig> {
        self.mutate(move |redirects| {
            if redirects.iter().any(|existing| existing.id == record.id) {
                return Err(StorageError::Conflict(record.id.to_string()));
            }
            redirects.push(record.clone());
            Ok(Outcome::Changed(record))
        })
        .await
    }

    async fn update_one(
        &self,
        id: &RedirectId,
        patch: &RedirectPatch,
        updated_at: Timestamp,
    ) -> StorageResult<Option<RedirectConfig>> {
        self.mutate(|redirects| {
            let Some(record) = redirects.iter_mut().find(|record| &record.id == id) else {
                return Ok(Outcome::Unchanged(None));
            };
            patch.apply_to(record, updated_at);
            Ok(Outcome::Changed(Some(record.clone())))
        })
        .await
    }

    async fn delete_one(&self, id: &RedirectId) -> StorageResult<bool> {
        self.mutate(|redirects| {
            let before = redirects.len();
            redirects.retain(|record| &record.id != id);
            if redirects.len() == before {
                Ok(Outcome::Unchanged(false))
            } else {
                Ok(Outcome::Changed(true))
            }
        })
        .await
    }
}

/// A process-local [`BlobBackend`].
///
/// Clones share the same document.
#[derive(Debug, Clone, Default)]
pub struct MemoryBlob {
    document: Arc<Mutex<BlobDocument>>,
}

impl MemoryBlob {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(document: BlobDocument) -> Self {
        Self {
            document: Arc::new(Mutex::new(document)),
        }
    }

    /// Returns a copy of the current document.
    pub fn snapshot(&self) -> BlobDocument {
        self.document.lock().clone()
    }
}

#[async_trait]
impl BlobBackend for MemoryBlob {
    fn is_configured(&self) -> bool {
        true
    }

    async fn load(&self) -> StorageResult<BlobDocument> {
        Ok(self.snapshot())
    }

    async fn save(&self, document: &BlobDocument) -> StorageResult<()> {
        *self.document.lock() = document.clone();
        Ok(())
    }
}
