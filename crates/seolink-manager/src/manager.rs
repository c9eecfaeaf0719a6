use crate::generator::IdGenerator;
use async_trait::async_trait;
use seolink_core::error::{RedirectError, Result, StorageError, StorageResult};
use seolink_core::{
    sort_newest_first, Clock, ListQuery, NewRedirect, RedirectConfig, RedirectId, RedirectListing,
    RedirectPatch, RedirectRepository, RedirectStore, Scope, SystemClock,
};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// A concrete implementation of the [`RedirectRepository`] trait.
///
/// Wraps a [`RedirectStore`], an [`IdGenerator`] and a [`Clock`], and
/// handles:
/// - field validation before any I/O
/// - id assignment and timestamps
/// - ownership checks against the caller's [`Scope`]
/// - the failure policy: reads degrade to empty results, writes surface
///   every error
/// - falling back to an in-memory sort when the store lacks an index
///
/// The generator is responsible for id uniqueness. No collision retry is
/// performed, a colliding create fails with a storage error.
#[derive(Debug, Clone)]
pub struct RedirectManager<S, G, C = SystemClock> {
    store: Arc<S>,
    generator: Arc<G>,
    clock: Arc<C>,
}

impl<S: RedirectStore, G: IdGenerator> RedirectManager<S, G> {
    pub fn new(store: S, generator: G) -> Self {
        Self::with_clock(store, generator, SystemClock)
    }
}

impl<S: RedirectStore, G: IdGenerator, C: Clock> RedirectManager<S, G, C> {
    pub fn with_clock(store: S, generator: G, clock: C) -> Self {
        Self {
            store: Arc::new(store),
            generator: Arc::new(generator),
            clock: Arc::new(clock),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reads the listing for `scope`, newest first, re-querying unordered
    /// and sorting locally if the store has no index for the ordered query.
    async fn read_listing(&self, scope: &Scope) -> StorageResult<Vec<RedirectConfig>> {
        match self.store.read_all(&ListQuery::newest_first(scope.clone())).await {
            Err(StorageError::IndexUnavailable(reason)) => {
                debug!(%reason, "ordered listing unavailable, sorting in memory");
                let mut records = self
                    .store
                    .read_all(&ListQuery::unordered(scope.clone()))
                    .await?;
                sort_newest_first(&mut records);
                Ok(records)
            }
            other => other,
        }
    }

    /// Loads a record for modification, checking existence then ownership.
    async fn load_owned(&self, id: &RedirectId, scope: &Scope) -> Result<Option<RedirectConfig>> {
        let Some(existing) = self.store.read_one(id).await? else {
            return Ok(None);
        };
        if !scope.permits(&existing) {
            warn!(%id, "rejected modification of a redirect owned by someone else");
            return Err(RedirectError::Unauthorized(id.to_string()));
        }
        Ok(Some(existing))
    }
}

#[async_trait]
impl<S: RedirectStore, G: IdGenerator, C: Clock> RedirectRepository for RedirectManager<S, G, C> {
    async fn list_all(&self, scope: &Scope) -> RedirectListing {
        match self.read_listing(scope).await {
            Ok(records) => {
                trace!(count = records.len(), "listed redirects");
                RedirectListing::connected(records)
            }
            Err(e) => {
                warn!(error = %e, "storage unavailable, returning an empty listing");
                RedirectListing::degraded(e.to_string())
            }
        }
    }

    async fn get_by_id(&self, id: &RedirectId, scope: &Scope) -> Option<RedirectConfig> {
        match self.store.read_one(id).await {
            Ok(Some(record)) if scope.permits(&record) => Some(record),
            Ok(Some(_)) => {
                debug!(%id, "redirect hidden by scope");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(%id, error = %e, "failed to read redirect");
                None
            }
        }
    }

    async fn create(&self, fields: NewRedirect, scope: &Scope) -> Result<RedirectConfig> {
        fields.validate()?;

        let id = self.generator.generate();
        let record = fields.into_record(id, scope.owner().cloned(), self.clock.now());

        let stored = self.store.write_one(record).await.map_err(|e| {
            warn!(error = %e, "failed to create redirect");
            RedirectError::from(e)
        })?;
        debug!(id = %stored.id, "created redirect");
        Ok(stored)
    }

    async fn update(
        &self,
        id: &RedirectId,
        patch: RedirectPatch,
        scope: &Scope,
    ) -> Result<RedirectConfig> {
        patch.validate()?;

        let existing = self
            .load_owned(id, scope)
            .await?
            .ok_or_else(|| RedirectError::NotFound(id.to_string()))?;

        let updated_at = self.clock.now().max(existing.created_at);
        let updated = self
            .store
            .update_one(id, &patch, updated_at)
            .await
            .map_err(|e| {
                warn!(%id, error = %e, "failed to update redirect");
                RedirectError::from(e)
            })?
            // deleted between the read and the write
            .ok_or_else(|| RedirectError::NotFound(id.to_string()))?;

        debug!(%id, fields = ?patch.field_names(), "updated redirect");
        Ok(updated)
    }

    async fn delete(&self, id: &RedirectId, scope: &Scope) -> Result<bool> {
        if self.load_owned(id, scope).await?.is_none() {
            trace!(%id, "nothing to delete");
            return Ok(false);
        }

        let removed = self.store.delete_one(id).await.map_err(|e| {
            warn!(%id, error = %e, "failed to delete redirect");
            RedirectError::from(e)
        })?;
        debug!(%id, removed, "deleted redirect");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::seq::SequentialIdGenerator;
    use jiff::{SignedDuration, Timestamp};
    use seolink_core::{ManualClock, OwnerId, PageType, StorageStatus};
    use seolink_storage::InMemoryStore;

    type Manager = RedirectManager<InMemoryStore, SequentialIdGenerator, ManualClock>;

    fn start() -> Timestamp {
        Timestamp::from_second(1_705_276_800).unwrap()
    }

    fn manager_with(store: InMemoryStore) -> (Manager, ManualClock) {
        let clock = ManualClock::new(start());
        let manager = RedirectManager::with_clock(
            store,
            SequentialIdGenerator::with_prefix("r"),
            clock.clone(),
        );
        (manager, clock)
    }

    fn manager() -> (Manager, ManualClock) {
        manager_with(InMemoryStore::new())
    }

    fn fields(title: &str) -> NewRedirect {
        NewRedirect::builder()
            .title(title)
            .description("Description")
            .target_url("https://example.com/page")
            .build()
    }

    fn alice() -> Scope {
        Scope::Owner(OwnerId::new("alice").unwrap())
    }

    fn bob() -> Scope {
        Scope::Owner(OwnerId::new("bob").unwrap())
    }

    /// A store whose backend cannot be reached.
    struct OfflineStore;

    #[async_trait]
    impl RedirectStore for OfflineStore {
        fn is_available(&self) -> bool {
            false
        }

        async fn read_all(&self, _query: &ListQuery) -> StorageResult<Vec<RedirectConfig>> {
            Err(StorageError::Unavailable("offline".into()))
        }

        async fn read_one(&self, _id: &RedirectId) -> StorageResult<Option<RedirectConfig>> {
            Err(StorageError::Unavailable("offline".into()))
        }

        async fn write_one(&self, _record: RedirectConfig) -> StorageResult<RedirectConfig> {
            Err(StorageError::Unavailable("offline".into()))
        }

        async fn update_one(
            &self,
            _id: &RedirectId,
            _patch: &RedirectPatch,
            _updated_at: Timestamp,
        ) -> StorageResult<Option<RedirectConfig>> {
            Err(StorageError::Unavailable("offline".into()))
        }

        async fn delete_one(&self, _id: &RedirectId) -> StorageResult<bool> {
            Err(StorageError::Unavailable("offline".into()))
        }
    }

    #[tokio::test]
    async fn create_applies_defaults_and_timestamps() {
        let (manager, _clock) = manager();

        let created = manager.create(fields("A"), &Scope::All).await.unwrap();

        assert_eq!(created.id.as_str(), "r000000");
        assert_eq!(created.page_type, Some(PageType::Website));
        assert_eq!(created.created_at, start());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.owner_id, None);
    }

    #[tokio::test]
    async fn create_assigns_unique_ids() {
        let (manager, _clock) = manager();

        let a = manager.create(fields("A"), &Scope::All).await.unwrap();
        let b = manager.create(fields("B"), &Scope::All).await.unwrap();

        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn create_stamps_owner_from_scope() {
        let (manager, _clock) = manager();

        let created = manager.create(fields("A"), &alice()).await.unwrap();

        assert_eq!(created.owner_id.as_ref().map(OwnerId::as_str), Some("alice"));
    }

    #[tokio::test]
    async fn create_rejects_invalid_fields_without_writing() {
        let (manager, _clock) = manager();
        let mut bad = fields("A");
        bad.target_url = "example.com".into();

        let err = manager.create(bad, &Scope::All).await.unwrap_err();

        assert!(matches!(err, RedirectError::Validation { field: "targetUrl", .. }));
        assert!(manager.store().is_empty());
    }

    #[tokio::test]
    async fn get_round_trips_created_record() {
        let (manager, _clock) = manager();
        let created = manager.create(fields("A"), &Scope::All).await.unwrap();

        let got = manager.get_by_id(&created.id, &Scope::All).await;

        assert_eq!(got, Some(created));
    }

    #[tokio::test]
    async fn get_hides_records_of_other_owners() {
        let (manager, _clock) = manager();
        let created = manager.create(fields("A"), &alice()).await.unwrap();

        assert!(manager.get_by_id(&created.id, &bob()).await.is_none());
        assert!(manager.get_by_id(&created.id, &alice()).await.is_some());
    }

    #[tokio::test]
    async fn list_is_newest_first_and_scoped() {
        let (manager, clock) = manager();
        let first = manager.create(fields("A"), &alice()).await.unwrap();
        clock.advance(SignedDuration::from_secs(1));
        manager.create(fields("B"), &bob()).await.unwrap();
        clock.advance(SignedDuration::from_secs(1));
        let third = manager.create(fields("C"), &alice()).await.unwrap();

        let listing = manager.list_all(&alice()).await;

        assert_eq!(listing.status, StorageStatus::Connected);
        let ids: Vec<_> = listing.redirects.iter().map(|r| r.id.clone()).collect();
        assert_eq!(ids, vec![third.id, first.id]);
        assert_eq!(manager.list_all(&Scope::All).await.redirects.len(), 3);
    }

    #[tokio::test]
    async fn fallback_listing_matches_indexed_listing() {
        let indexed = InMemoryStore::new();
        let unindexed = indexed.clone().without_ordering_index();
        let (manager, clock) = manager_with(indexed);

        // equal timestamps exercise the id tie-break
        manager.create(fields("A"), &alice()).await.unwrap();
        manager.create(fields("B"), &alice()).await.unwrap();
        clock.advance(SignedDuration::from_secs(5));
        manager.create(fields("C"), &alice()).await.unwrap();
        manager.create(fields("D"), &bob()).await.unwrap();

        let (fallback, _clock) = manager_with(unindexed);

        let expected = manager.list_all(&alice()).await;
        let actual = fallback.list_all(&alice()).await;

        assert_eq!(actual, expected);
        let ids: Vec<_> = actual.redirects.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r000002", "r000001", "r000000"]);
    }

    #[tokio::test]
    async fn update_merges_and_advances_updated_at() {
        let (manager, clock) = manager();
        let mut new = fields("A");
        new.keywords = Some("one".into());
        let created = manager.create(new, &Scope::All).await.unwrap();
        clock.advance(SignedDuration::from_secs(30));

        let patch = RedirectPatch {
            title: Some("Renamed".into()),
            ..Default::default()
        };
        let updated = manager.update(&created.id, patch, &Scope::All).await.unwrap();

        assert_eq!(updated.title, "Renamed");
        assert_eq!(updated.description, created.description);
        assert_eq!(updated.keywords, created.keywords);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at > updated.created_at);
        assert_eq!(
            manager.get_by_id(&created.id, &Scope::All).await,
            Some(updated)
        );
    }

    #[tokio::test]
    async fn update_never_moves_updated_at_backwards() {
        let (manager, clock) = manager();
        let created = manager.create(fields("A"), &Scope::All).await.unwrap();
        clock.advance(SignedDuration::from_secs(-60));

        let updated = manager
            .update(&created.id, RedirectPatch::default(), &Scope::All)
            .await
            .unwrap();

        assert_eq!(updated.updated_at, created.created_at);
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let (manager, _clock) = manager();

        let err = manager
            .update(
                &RedirectId::new_unchecked("missing"),
                RedirectPatch::default(),
                &alice(),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, RedirectError::NotFound(_)));
    }

    #[tokio::test]
    async fn update_of_foreign_record_is_unauthorized() {
        let (manager, _clock) = manager();
        let created = manager.create(fields("A"), &alice()).await.unwrap();
        let patch = RedirectPatch {
            title: Some("Hijacked".into()),
            ..Default::default()
        };

        let err = manager.update(&created.id, patch, &bob()).await.unwrap_err();

        assert!(matches!(err, RedirectError::Unauthorized(_)));
        let stored = manager.get_by_id(&created.id, &alice()).await.unwrap();
        assert_eq!(stored.title, "A");
    }

    #[tokio::test]
    async fn update_validates_before_checking_existence() {
        let (manager, _clock) = manager();
        let patch = RedirectPatch {
            title: Some("  ".into()),
            ..Default::default()
        };

        let err = manager
            .update(&RedirectId::new_unchecked("missing"), patch, &Scope::All)
            .await
            .unwrap_err();

        assert!(matches!(err, RedirectError::Validation { field: "title", .. }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (manager, _clock) = manager();
        let created = manager.create(fields("A"), &Scope::All).await.unwrap();

        assert!(manager.delete(&created.id, &Scope::All).await.unwrap());
        assert!(!manager.delete(&created.id, &Scope::All).await.unwrap());
        assert!(manager.get_by_id(&created.id, &Scope::All).await.is_none());
    }

    #[tokio::test]
    async fn delete_of_foreign_record_is_unauthorized() {
        let (manager, _clock) = manager();
        let created = manager.create(fields("A"), &alice()).await.unwrap();

        let err = manager.delete(&created.id, &bob()).await.unwrap_err();

        assert!(matches!(err, RedirectError::Unauthorized(_)));
        assert_eq!(manager.store().len(), 1);
    }

    #[tokio::test]
    async fn public_url_combines_get_and_build() {
        let (manager, _clock) = manager();
        let created = manager.create(fields("A"), &alice()).await.unwrap();

        let url = manager
            .public_url("https://seo.example/", &created.id, &alice())
            .await
            .unwrap();
        assert_eq!(
            url,
            "https://seo.example/u?title=A&desc=Description&url=https%3A%2F%2Fexample.com%2Fpage&type=website"
        );

        assert!(manager
            .public_url("https://seo.example", &created.id, &bob())
            .await
            .is_none());
    }

    #[tokio::test]
    async fn offline_reads_degrade() {
        let manager = RedirectManager::new(OfflineStore, SequentialIdGenerator::with_prefix("r"));

        let listing = manager.list_all(&Scope::All).await;
        assert!(listing.is_degraded());
        assert!(listing.redirects.is_empty());

        assert!(manager
            .get_by_id(&RedirectId::new_unchecked("r000000"), &Scope::All)
            .await
            .is_none());
    }

    #[tokio::test]
    async fn offline_writes_surface() {
        let manager = RedirectManager::new(OfflineStore, SequentialIdGenerator::with_prefix("r"));
        let id = RedirectId::new_unchecked("r000000");

        let err = manager.create(fields("A"), &Scope::All).await.unwrap_err();
        assert!(matches!(err, RedirectError::StorageUnavailable(_)));

        let err = manager
            .update(&id, RedirectPatch::default(), &Scope::All)
            .await
            .unwrap_err();
        assert!(matches!(err, RedirectError::StorageUnavailable(_)));

        let err = manager.delete(&id, &Scope::All).await.unwrap_err();
        assert!(matches!(err, RedirectError::StorageUnavailable(_)));
    }
}
