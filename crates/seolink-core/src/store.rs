use crate::error::StorageResult;
use crate::redirect::{RedirectConfig, RedirectId, RedirectPatch};
use crate::scope::Scope;
use async_trait::async_trait;
use jiff::Timestamp;
use std::cmp::Ordering;

/// Ordering requested from [`RedirectStore::read_all`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ListOrder {
    /// Descending `createdAt`, ties broken by descending id.
    #[default]
    NewestFirst,
    /// Whatever order the backend returns.
    Unordered,
}

/// A listing query against a store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListQuery {
    pub scope: Scope,
    pub order: ListOrder,
}

impl ListQuery {
    pub fn newest_first(scope: Scope) -> Self {
        Self {
            scope,
            order: ListOrder::NewestFirst,
        }
    }

    pub fn unordered(scope: Scope) -> Self {
        Self {
            scope,
            order: ListOrder::Unordered,
        }
    }
}

/// The storage adapter contract.
///
/// Adapters move records between the repository and a backend. They do not
/// validate fields or check ownership, the repository does that before
/// calling in.
#[async_trait]
pub trait RedirectStore: Send + Sync + 'static {
    /// Whether the backend is configured and expected to answer.
    fn is_available(&self) -> bool;

    /// Returns the records matching `query.scope`.
    ///
    /// Returns `Err(IndexUnavailable)` if the backend cannot serve
    /// `ListOrder::NewestFirst` for this scope.
    async fn read_all(&self, query: &ListQuery) -> StorageResult<Vec<RedirectConfig>>;

    /// Returns `None` if the id does not exist.
    async fn read_one(&self, id: &RedirectId) -> StorageResult<Option<RedirectConfig>>;

    /// Persists a new record. Returns `Err(Conflict)` if the id is taken.
    async fn write_one(&self, record: RedirectConfig) -> StorageResult<RedirectConfig>;

    /// Applies `patch` to the stored record and stamps `updated_at`.
    /// Returns `None` if the id does not exist.
    async fn update_one(
        &self,
        id: &RedirectId,
        patch: &RedirectPatch,
        updated_at: Timestamp,
    ) -> StorageResult<Option<RedirectConfig>>;

    /// Hard-deletes a record. Returns `true` if it existed.
    async fn delete_one(&self, id: &RedirectId) -> StorageResult<bool>;
}

fn newest_first(a: &RedirectConfig, b: &RedirectConfig) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

/// Sorts records the way an indexed `createdAt DESC` query returns them.
pub fn sort_newest_first(records: &mut [RedirectConfig]) {
    records.sort_by(newest_first);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::redirect::NewRedirect;

    fn record(id: &str, second: i64) -> RedirectConfig {
        NewRedirect::builder()
            .title("t")
            .description("d")
            .target_url("https://example.com")
            .build()
            .into_record(
                RedirectId::new_unchecked(id),
                None,
                Timestamp::from_second(second).unwrap(),
            )
    }

    #[test]
    fn sorts_by_created_at_descending() {
        let mut records = vec![record("a", 10), record("b", 30), record("c", 20)];
        sort_newest_first(&mut records);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "c", "a"]);
    }

    #[test]
    fn ties_break_on_descending_id() {
        let mut records = vec![record("a", 10), record("c", 10), record("b", 10)];
        sort_newest_first(&mut records);

        let ids: Vec<_> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }
}
