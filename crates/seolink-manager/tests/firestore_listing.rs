use jiff::{SignedDuration, Timestamp};
use seolink_core::{
    ListQuery, ManualClock, NewRedirect, OwnerId, RedirectConfig, RedirectRepository,
    RedirectStore, Scope, StorageError,
};
use seolink_manager::{RedirectManager, SequentialIdGenerator};
use seolink_storage::{FirestoreConfig, FirestoreStore};
use seolink_test_infra::{FirestoreServer, FirestoreServerConfig};

type Manager = RedirectManager<FirestoreStore, SequentialIdGenerator, ManualClock>;

async fn manager(require_composite_index: bool) -> (FirestoreServer, Manager, ManualClock) {
    let server = FirestoreServer::with_config(
        FirestoreServerConfig::builder()
            .require_composite_index(require_composite_index)
            .build(),
    )
    .await;
    let store = FirestoreStore::new(
        FirestoreConfig::builder()
            .api_base(server.api_base())
            .project_id(Some(server.project_id().to_string()))
            .api_key(Some(server.api_key().to_string()))
            .build(),
    );
    let clock = ManualClock::new(Timestamp::from_second(1_705_276_800).unwrap());
    let manager = RedirectManager::with_clock(
        store,
        SequentialIdGenerator::with_prefix("r"),
        clock.clone(),
    );
    (server, manager, clock)
}

fn owner(value: &str) -> Scope {
    Scope::Owner(OwnerId::new(value).unwrap())
}

fn fields(title: &str) -> NewRedirect {
    NewRedirect::builder()
        .title(title)
        .description("Description")
        .target_url("https://example.com/page")
        .build()
}

/// Creates records for two owners with runs of equal creation times, and
/// one run created after the clock was set back.
async fn populate(manager: &Manager, clock: &ManualClock) {
    let plan = [
        ("alice", 0),
        ("bob", 0),
        ("alice", 0),
        ("alice", 60),
        ("bob", 0),
        ("alice", 0),
        ("alice", -3600),
        ("alice", 0),
    ];
    for (i, (who, step)) in plan.into_iter().enumerate() {
        clock.advance(SignedDuration::from_secs(step));
        manager
            .create(fields(&format!("{who} {i}")), &owner(who))
            .await
            .unwrap();
    }
}

fn ids(records: &[RedirectConfig]) -> Vec<&str> {
    records.iter().map(|r| r.id.as_str()).collect()
}

#[tokio::test]
async fn owner_listing_without_index_matches_indexed_listing() {
    let (_indexed_server, indexed, indexed_clock) = manager(false).await;
    let (_plain_server, plain, plain_clock) = manager(true).await;
    populate(&indexed, &indexed_clock).await;
    populate(&plain, &plain_clock).await;

    let err = plain
        .store()
        .read_all(&ListQuery::newest_first(owner("alice")))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::IndexUnavailable(_)), "unexpected error: {err:?}");

    for scope in [owner("alice"), owner("bob"), owner("nobody"), Scope::All] {
        let expected = indexed.list_all(&scope).await;
        let actual = plain.list_all(&scope).await;
        assert!(!expected.is_degraded());
        assert!(!actual.is_degraded());
        assert_eq!(actual.redirects, expected.redirects, "scope {scope:?}");
    }

    let alice = plain.list_all(&owner("alice")).await;
    assert_eq!(
        ids(&alice.redirects),
        vec!["r000005", "r000003", "r000002", "r000000", "r000007", "r000006"]
    );
}
