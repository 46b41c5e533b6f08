//! End-to-end flows through the catalogue services backed by the in-memory
//! store and a recording channel.

use std::sync::Arc;

use fold_backend::domain::ports::{CatalogueCommand, CatalogueQuery, SyncChannelError};
use fold_backend::domain::{
    CatalogueError, CatalogueQueryService, CatalogueService, DEFAULT_PUBLISH_TIMEOUT,
    HashtagDraft, ProjectDraft, ProjectLinks, SYNC_ORDERING_KEY, SyncDispatcher, SyncMethod,
    UserDraft,
};
use fold_backend::test_support::{
    FixedClock, InMemoryCatalogueStore, Journal, JournalEntry, RecordingSyncChannel,
    StoreOperation,
};
use rstest::{fixture, rstest};
use tokio_util::sync::CancellationToken;

struct World {
    store: Arc<InMemoryCatalogueStore>,
    channel: Arc<RecordingSyncChannel>,
    journal: Journal,
    commands: CatalogueService<InMemoryCatalogueStore>,
    queries: CatalogueQueryService<InMemoryCatalogueStore>,
    cancel: CancellationToken,
}

#[fixture]
fn world() -> World {
    let journal = Journal::default();
    let store = Arc::new(InMemoryCatalogueStore::with_journal(journal.clone()));
    let channel = Arc::new(RecordingSyncChannel::with_journal(journal.clone()));
    let commands = CatalogueService::new(
        store.clone(),
        SyncDispatcher::new(channel.clone(), DEFAULT_PUBLISH_TIMEOUT),
        Arc::new(FixedClock::default()),
    );
    let queries = CatalogueQueryService::new(store.clone());
    World {
        store,
        channel,
        journal,
        commands,
        queries,
        cancel: CancellationToken::new(),
    }
}

fn fold_project() -> ProjectDraft {
    ProjectDraft::new("fold", "fold", "catalogue sync").expect("valid project")
}

#[rstest]
#[tokio::test]
async fn hashtag_lifecycle_resyncs_dependent_project(world: World) {
    let golang = world
        .commands
        .create_hashtag(HashtagDraft::new("golang").expect("draft"), &world.cancel)
        .await
        .expect("create hashtag");
    assert!(world.channel.messages().is_empty());

    let project = world
        .commands
        .create_project(
            fold_project(),
            ProjectLinks::new([], [golang.id]),
            &world.cancel,
        )
        .await
        .expect("create project");

    let created = world.channel.messages();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].method, SyncMethod::Upsert);
    assert_eq!(created[0].doc.id, project.id);
    assert_eq!(created[0].doc.name, "fold");
    assert_eq!(created[0].doc.hashtags, vec![golang.clone()]);
    assert!(created[0].doc.users.is_empty());

    world
        .commands
        .delete_hashtag(golang.id, &world.cancel)
        .await
        .expect("delete hashtag");

    let messages = world.channel.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].doc.id, project.id);
    assert_eq!(messages[1].method, SyncMethod::Upsert);
    assert!(messages[1].doc.hashtags.is_empty());

    let entries = world.journal.entries();
    let republished = entries
        .iter()
        .rposition(|entry| matches!(entry, JournalEntry::Published { .. }))
        .expect("resync recorded");
    let unlinked = world
        .journal
        .position(&JournalEntry::Store(StoreOperation::UnlinkHashtag))
        .expect("link rows removed");
    let deleted = world
        .journal
        .position(&JournalEntry::Store(StoreOperation::DeleteHashtag))
        .expect("hashtag row removed");
    assert!(republished < unlinked && unlinked < deleted);

    let tables = world.store.tables().await;
    assert!(tables.hashtags.is_empty());
    assert!(tables.project_hashtags.is_empty());
    assert!(tables.projects.contains_key(&project.id));
}

#[rstest]
#[tokio::test]
async fn every_message_shares_the_ordering_key_with_distinct_dedup_keys(world: World) {
    let ada = world
        .commands
        .create_user(UserDraft::new("ada").expect("draft"), &world.cancel)
        .await
        .expect("create user");
    for name in ["fold", "crease"] {
        world
            .commands
            .create_project(
                ProjectDraft::new(name, name, "").expect("draft"),
                ProjectLinks::new([ada.id], []),
                &world.cancel,
            )
            .await
            .expect("create project");
    }
    world
        .commands
        .update_user(ada.id, UserDraft::new("Ada Lovelace").expect("draft"), &world.cancel)
        .await
        .expect("rename user");

    let envelopes = world.channel.envelopes();
    assert_eq!(envelopes.len(), 4);
    assert!(
        envelopes
            .iter()
            .all(|envelope| envelope.ordering_key == SYNC_ORDERING_KEY)
    );
    let mut dedup_keys: Vec<_> = envelopes.iter().map(|e| e.dedup_key.clone()).collect();
    dedup_keys.sort();
    dedup_keys.dedup();
    assert_eq!(dedup_keys.len(), 4);

    let renamed = &world.channel.messages()[2..];
    assert!(
        renamed
            .iter()
            .all(|message| message.doc.users[0].name == "Ada Lovelace")
    );
}

#[rstest]
#[tokio::test]
async fn rejected_publish_leaves_reads_unchanged(world: World) {
    let ada = world
        .commands
        .create_user(UserDraft::new("ada").expect("draft"), &world.cancel)
        .await
        .expect("create user");
    let project = world
        .commands
        .create_project(fold_project(), ProjectLinks::new([ada.id], []), &world.cancel)
        .await
        .expect("create project");

    world
        .channel
        .fail_with(SyncChannelError::rejected("indexer refused document"));
    let result = world
        .commands
        .update_project(
            project.id,
            ProjectDraft::new("fold v2", "fold-v2", "").expect("draft"),
            ProjectLinks::default(),
            &world.cancel,
        )
        .await;
    assert!(matches!(result, Err(CatalogueError::Publish { .. })));
    assert_eq!(world.journal.entries().last(), Some(&JournalEntry::RolledBack));

    let reread = world.queries.get_project(project.id).await.expect("read");
    assert_eq!(reread, project);
}

#[rstest]
#[tokio::test]
async fn deleted_project_disappears_from_listing(world: World) {
    let first = world
        .commands
        .create_project(fold_project(), ProjectLinks::default(), &world.cancel)
        .await
        .expect("create first");
    let second = world
        .commands
        .create_project(
            ProjectDraft::new("crease", "crease", "").expect("draft"),
            ProjectLinks::default(),
            &world.cancel,
        )
        .await
        .expect("create second");

    world
        .commands
        .delete_project(first.id, &world.cancel)
        .await
        .expect("delete project");

    let listed = world.queries.list_projects().await.expect("list");
    assert_eq!(listed, vec![second]);
    let last = world.channel.messages().pop().expect("delete message");
    assert_eq!(last.method, SyncMethod::Delete);
    assert_eq!(last.doc.id, first.id);
}
