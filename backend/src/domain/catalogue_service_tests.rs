//! Tests for the catalogue command service.

use std::sync::Arc;
use std::time::Duration;

use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

use super::*;
use crate::domain::ports::{MockSyncChannel, SyncChannelError};
use crate::domain::{DEFAULT_PUBLISH_TIMEOUT, SyncMessage};
use crate::test_support::{
    FixedClock, InMemoryCatalogueStore, Journal, JournalEntry, RecordingSyncChannel,
    StalledSyncChannel, StoreOperation,
};

struct Harness {
    store: Arc<InMemoryCatalogueStore>,
    channel: Arc<RecordingSyncChannel>,
    journal: Journal,
    service: CatalogueService<InMemoryCatalogueStore>,
    cancel: CancellationToken,
}

impl Harness {
    fn messages(&self) -> Vec<SyncMessage> {
        self.channel.messages()
    }
}

#[fixture]
fn harness() -> Harness {
    let journal = Journal::default();
    let store = Arc::new(InMemoryCatalogueStore::with_journal(journal.clone()));
    let channel = Arc::new(RecordingSyncChannel::with_journal(journal.clone()));
    let service = CatalogueService::new(
        Arc::clone(&store),
        SyncDispatcher::new(channel.clone(), DEFAULT_PUBLISH_TIMEOUT),
        Arc::new(FixedClock::default()),
    );
    Harness {
        store,
        channel,
        journal,
        service,
        cancel: CancellationToken::new(),
    }
}

fn project_draft(name: &str) -> ProjectDraft {
    ProjectDraft::new(name, name, "").expect("valid project draft")
}

#[rstest]
#[tokio::test]
async fn create_user_inserts_without_dispatch(harness: Harness) {
    let user = harness
        .service
        .create_user(UserDraft::new("ada").expect("draft"), &harness.cancel)
        .await
        .expect("create user");

    let tables = harness.store.tables().await;
    assert_eq!(tables.users.get(&user.id), Some(&user));
    assert_eq!(user.created_at, crate::test_support::fixed_instant());
    assert!(harness.messages().is_empty());
}

#[rstest]
#[tokio::test]
async fn create_project_links_and_publishes_snapshot(harness: Harness) {
    let ada = harness.store.seed_user("ada").await;
    let grace = harness.store.seed_user("grace").await;
    let rust = harness.store.seed_hashtag("rust").await;

    let details = harness
        .service
        .create_project(
            project_draft("fold"),
            ProjectLinks::new([grace.id, ada.id], [rust.id]),
            &harness.cancel,
        )
        .await
        .expect("create project");

    assert_eq!(details.user_ids, vec![ada.id, grace.id]);
    assert_eq!(details.hashtag_ids, vec![rust.id]);
    let messages = harness.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].method, SyncMethod::Upsert);
    assert_eq!(messages[0].doc.id, details.id);
    assert_eq!(messages[0].doc.users, vec![ada, grace]);
    assert_eq!(messages[0].doc.hashtags, vec![rust]);
}

#[rstest]
#[tokio::test]
async fn unknown_hashtag_leaves_no_rows_and_sends_nothing(harness: Harness) {
    let ada = harness.store.seed_user("ada").await;

    let err = harness
        .service
        .create_project(
            project_draft("fold"),
            ProjectLinks::new([ada.id], [HashtagId::new(404)]),
            &harness.cancel,
        )
        .await
        .expect_err("unknown hashtag");

    assert_eq!(err, CatalogueError::validation(EntityKind::Hashtag, 404));
    let tables = harness.store.tables().await;
    assert!(tables.projects.is_empty());
    assert!(tables.user_projects.is_empty());
    assert!(tables.project_hashtags.is_empty());
    assert!(harness.messages().is_empty());
    assert_eq!(
        harness.journal.position(&JournalEntry::Store(StoreOperation::InsertProject)),
        None
    );
}

#[rstest]
#[tokio::test]
async fn update_project_replaces_associations_idempotently(harness: Harness) {
    let ada = harness.store.seed_user("ada").await;
    let grace = harness.store.seed_user("grace").await;
    let rust = harness.store.seed_hashtag("rust").await;
    let project = harness.store.seed_project("fold", "fold").await;
    harness.store.seed_user_link(project.id, ada.id).await;
    harness.store.seed_hashtag_link(project.id, rust.id).await;
    let links = ProjectLinks::new([grace.id], []);

    for _ in 0..2 {
        harness
            .service
            .update_project(
                project.id,
                ProjectDraft::new("fold v2", "fold-v2", "renamed").expect("draft"),
                links.clone(),
                &harness.cancel,
            )
            .await
            .expect("update project");
    }

    let tables = harness.store.tables().await;
    assert_eq!(tables.user_ids_for(project.id), vec![grace.id]);
    assert!(tables.hashtag_ids_for(project.id).is_empty());
    let stored = tables.projects.get(&project.id).expect("project row");
    assert_eq!(stored.slug, "fold-v2");
    assert_eq!(stored.created_at, project.created_at);
    let messages = harness.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0], messages[1]);
    assert_eq!(messages[1].doc.users, vec![grace]);
}

#[rstest]
#[tokio::test]
async fn update_missing_project_is_not_found(harness: Harness) {
    let err = harness
        .service
        .update_project(
            ProjectId::new(9),
            project_draft("fold"),
            ProjectLinks::default(),
            &harness.cancel,
        )
        .await
        .expect_err("missing project");

    assert_eq!(err, CatalogueError::not_found(EntityKind::Project, 9));
    assert!(harness.messages().is_empty());
}

#[rstest]
#[tokio::test]
async fn update_hashtag_resyncs_every_linked_project(harness: Harness) {
    let rust = harness.store.seed_hashtag("rust").await;
    let first = harness.store.seed_project("first", "first").await;
    let second = harness.store.seed_project("second", "second").await;
    let unrelated = harness.store.seed_project("other", "other").await;
    harness.store.seed_hashtag_link(second.id, rust.id).await;
    harness.store.seed_hashtag_link(first.id, rust.id).await;

    let renamed = harness
        .service
        .update_hashtag(
            rust.id,
            HashtagDraft::new("rustlang").expect("draft"),
            &harness.cancel,
        )
        .await
        .expect("update hashtag");

    assert_eq!(renamed.name, "rustlang");
    let messages = harness.messages();
    let ids: Vec<_> = messages.iter().map(|message| message.doc.id).collect();
    assert_eq!(ids, vec![first.id, second.id]);
    assert!(!ids.contains(&unrelated.id));
    for message in &messages {
        assert_eq!(message.doc.hashtags, vec![renamed.clone()]);
    }
}

#[rstest]
#[tokio::test]
async fn delete_user_resyncs_before_unlinking(harness: Harness) {
    let ada = harness.store.seed_user("ada").await;
    let grace = harness.store.seed_user("grace").await;
    let project = harness.store.seed_project("fold", "fold").await;
    harness.store.seed_user_link(project.id, ada.id).await;
    harness.store.seed_user_link(project.id, grace.id).await;

    harness
        .service
        .delete_user(ada.id, &harness.cancel)
        .await
        .expect("delete user");

    let published = harness
        .journal
        .position(&JournalEntry::Published {
            project: project.id,
            method: SyncMethod::Upsert,
        })
        .expect("project resynced");
    let unlinked = harness
        .journal
        .position(&JournalEntry::Store(StoreOperation::UnlinkUser))
        .expect("links removed");
    assert!(published < unlinked);

    let tables = harness.store.tables().await;
    assert_eq!(tables.user_ids_for(project.id), vec![grace.id]);
    assert!(!tables.users.contains_key(&ada.id));
    assert_eq!(harness.messages()[0].doc.users, vec![grace]);
}

#[rstest]
#[tokio::test]
async fn delete_hashtag_resyncs_linked_project_only(harness: Harness) {
    let golang = harness.store.seed_hashtag("golang").await;
    let project = harness.store.seed_project("fold", "fold").await;
    harness.store.seed_hashtag_link(project.id, golang.id).await;

    harness
        .service
        .delete_hashtag(golang.id, &harness.cancel)
        .await
        .expect("delete hashtag");

    let messages = harness.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].doc.id, project.id);
    assert!(messages[0].doc.hashtags.is_empty());
    let published = harness
        .journal
        .position(&JournalEntry::Published {
            project: project.id,
            method: SyncMethod::Upsert,
        })
        .expect("published");
    let unlinked = harness
        .journal
        .position(&JournalEntry::Store(StoreOperation::UnlinkHashtag))
        .expect("unlinked");
    let removed = harness
        .journal
        .position(&JournalEntry::Store(StoreOperation::DeleteHashtag))
        .expect("removed");
    assert!(published < unlinked && unlinked < removed);
    let tables = harness.store.tables().await;
    assert!(tables.hashtags.is_empty());
    assert!(tables.project_hashtags.is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_project_publishes_delete_before_removal(harness: Harness) {
    let ada = harness.store.seed_user("ada").await;
    let project = harness.store.seed_project("fold", "fold").await;
    harness.store.seed_user_link(project.id, ada.id).await;

    harness
        .service
        .delete_project(project.id, &harness.cancel)
        .await
        .expect("delete project");

    let messages = harness.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].method, SyncMethod::Delete);
    assert_eq!(messages[0].doc.users, vec![ada]);
    let tables = harness.store.tables().await;
    assert!(tables.projects.is_empty());
    assert!(tables.user_projects.is_empty());
}

#[rstest]
#[tokio::test]
async fn delete_missing_user_is_not_found(harness: Harness) {
    let err = harness
        .service
        .delete_user(UserId::new(3), &harness.cancel)
        .await
        .expect_err("missing user");

    assert_eq!(err, CatalogueError::not_found(EntityKind::User, 3));
}

#[rstest]
#[tokio::test]
async fn publish_failure_rolls_back_every_write(harness: Harness) {
    let rust = harness.store.seed_hashtag("rust").await;
    harness
        .channel
        .fail_with(SyncChannelError::unavailable("broker down"));

    let err = harness
        .service
        .create_project(
            project_draft("fold"),
            ProjectLinks::new([], [rust.id]),
            &harness.cancel,
        )
        .await
        .expect_err("publish failure");

    assert_eq!(
        err,
        CatalogueError::Publish {
            source: SyncChannelError::unavailable("broker down"),
        }
    );
    let tables = harness.store.tables().await;
    assert!(tables.projects.is_empty());
    assert!(tables.project_hashtags.is_empty());
    assert_eq!(harness.journal.entries().last(), Some(&JournalEntry::RolledBack));
}

#[rstest]
#[tokio::test]
async fn store_failure_mid_fanout_aborts(harness: Harness) {
    let ada = harness.store.seed_user("ada").await;
    let project = harness.store.seed_project("fold", "fold").await;
    harness.store.seed_user_link(project.id, ada.id).await;
    harness.store.fail_on(StoreOperation::HashtagsForProject);

    let err = harness
        .service
        .update_user(ada.id, UserDraft::new("ada l.").expect("draft"), &harness.cancel)
        .await
        .expect_err("store failure");

    assert!(matches!(
        err,
        CatalogueError::Store {
            phase: SyncPhase::Denormalizing,
            ..
        }
    ));
    let tables = harness.store.tables().await;
    assert_eq!(tables.users.get(&ada.id).map(|user| user.name.as_str()), Some("ada"));
    assert!(harness.messages().is_empty());
}

#[rstest]
#[tokio::test]
async fn cancelled_token_writes_nothing(harness: Harness) {
    harness.cancel.cancel();

    let err = harness
        .service
        .create_hashtag(HashtagDraft::new("rust").expect("draft"), &harness.cancel)
        .await
        .expect_err("cancelled");

    assert_eq!(err, CatalogueError::Cancelled);
    assert!(harness.store.tables().await.hashtags.is_empty());
}

#[rstest]
#[tokio::test(start_paused = true)]
async fn cancellation_during_publish_rolls_back() {
    let store = Arc::new(InMemoryCatalogueStore::new());
    let service = CatalogueService::new(
        Arc::clone(&store),
        SyncDispatcher::new(Arc::new(StalledSyncChannel), Duration::from_secs(60)),
        Arc::new(FixedClock::default()),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        trigger.cancel();
    });

    let err = service
        .create_project(project_draft("fold"), ProjectLinks::default(), &cancel)
        .await
        .expect_err("cancelled");

    assert_eq!(err, CatalogueError::Cancelled);
    assert!(store.tables().await.projects.is_empty());
}

#[rstest]
#[tokio::test]
async fn fanout_stops_at_first_rejected_publish() {
    let store = Arc::new(InMemoryCatalogueStore::new());
    let rust = store.seed_hashtag("rust").await;
    let first = store.seed_project("first", "first").await;
    let second = store.seed_project("second", "second").await;
    store.seed_hashtag_link(first.id, rust.id).await;
    store.seed_hashtag_link(second.id, rust.id).await;
    let mut channel = MockSyncChannel::new();
    channel
        .expect_publish()
        .times(1)
        .returning(|_| Err(SyncChannelError::rejected("throttled")));
    let service = CatalogueService::new(
        Arc::clone(&store),
        SyncDispatcher::new(Arc::new(channel), DEFAULT_PUBLISH_TIMEOUT),
        Arc::new(FixedClock::default()),
    );

    let err = service
        .update_hashtag(
            rust.id,
            HashtagDraft::new("rustlang").expect("draft"),
            &CancellationToken::new(),
        )
        .await
        .expect_err("rejected");

    assert!(matches!(err, CatalogueError::Publish { .. }));
    let tables = store.tables().await;
    assert_eq!(
        tables.hashtags.get(&rust.id).map(|hashtag| hashtag.name.as_str()),
        Some("rust")
    );
}
