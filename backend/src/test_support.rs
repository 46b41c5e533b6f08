//! Test doubles for the catalogue ports.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`,
//! through the `test-support` feature). The in-memory store gives every
//! transaction a private working copy of the tables and serialises
//! transactions behind one lock, so commit and rollback behave like the
//! relational store without a database.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::domain::ports::{
    AssociationStore, CatalogueTransactions, EntityStore, OutboundMessage, StoreError,
    SyncChannel, SyncChannelError,
};
use crate::domain::{
    Hashtag, HashtagDraft, HashtagId, Project, ProjectDraft, ProjectId, SyncMessage, SyncMethod,
    User, UserDraft, UserId,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Store calls that can be observed in the journal or made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    Begin,
    Commit,
    InsertUser,
    FindUser,
    UpdateUser,
    DeleteUser,
    UserExists,
    InsertHashtag,
    FindHashtag,
    UpdateHashtag,
    DeleteHashtag,
    HashtagExists,
    InsertProject,
    FindProject,
    UpdateProject,
    DeleteProject,
    ProjectExists,
    ListProjects,
    ProjectIdsForUser,
    ProjectIdsForHashtag,
    UserIdsForProject,
    HashtagIdsForProject,
    UsersForProject,
    HashtagsForProject,
    ClearProjectLinks,
    LinkProjectUsers,
    LinkProjectHashtags,
    UnlinkUser,
    UnlinkHashtag,
}

impl StoreOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::InsertUser => "insert_user",
            Self::FindUser => "find_user",
            Self::UpdateUser => "update_user",
            Self::DeleteUser => "delete_user",
            Self::UserExists => "user_exists",
            Self::InsertHashtag => "insert_hashtag",
            Self::FindHashtag => "find_hashtag",
            Self::UpdateHashtag => "update_hashtag",
            Self::DeleteHashtag => "delete_hashtag",
            Self::HashtagExists => "hashtag_exists",
            Self::InsertProject => "insert_project",
            Self::FindProject => "find_project",
            Self::UpdateProject => "update_project",
            Self::DeleteProject => "delete_project",
            Self::ProjectExists => "project_exists",
            Self::ListProjects => "list_projects",
            Self::ProjectIdsForUser => "project_ids_for_user",
            Self::ProjectIdsForHashtag => "project_ids_for_hashtag",
            Self::UserIdsForProject => "user_ids_for_project",
            Self::HashtagIdsForProject => "hashtag_ids_for_project",
            Self::UsersForProject => "users_for_project",
            Self::HashtagsForProject => "hashtags_for_project",
            Self::ClearProjectLinks => "clear_project_links",
            Self::LinkProjectUsers => "link_project_users",
            Self::LinkProjectHashtags => "link_project_hashtags",
            Self::UnlinkUser => "unlink_user",
            Self::UnlinkHashtag => "unlink_hashtag",
        }
    }
}

/// One observable event across the store and the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JournalEntry {
    Store(StoreOperation),
    Published {
        project: ProjectId,
        method: SyncMethod,
    },
    Committed,
    RolledBack,
}

/// Ordered record of events shared between doubles.
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<JournalEntry>>>);

impl Journal {
    pub fn record(&self, entry: JournalEntry) {
        lock(&self.0).push(entry);
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        lock(&self.0).clone()
    }

    /// Position of the first entry equal to `entry`.
    pub fn position(&self, entry: &JournalEntry) -> Option<usize> {
        lock(&self.0).iter().position(|candidate| candidate == entry)
    }
}

/// Plain-data copy of every catalogue table.
#[derive(Debug, Clone, Default)]
pub struct CatalogueTables {
    pub users: BTreeMap<UserId, User>,
    pub hashtags: BTreeMap<HashtagId, Hashtag>,
    pub projects: BTreeMap<ProjectId, Project>,
    /// `user_projects` rows keyed `(project_id, user_id)`.
    pub user_projects: BTreeSet<(ProjectId, UserId)>,
    /// `project_hashtags` rows keyed `(project_id, hashtag_id)`.
    pub project_hashtags: BTreeSet<(ProjectId, HashtagId)>,
    next_id: i32,
}

impl CatalogueTables {
    fn allocate_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    pub fn user_ids_for(&self, project: ProjectId) -> Vec<UserId> {
        self.user_projects
            .iter()
            .filter(|(owner, _)| *owner == project)
            .map(|(_, user)| *user)
            .collect()
    }

    pub fn hashtag_ids_for(&self, project: ProjectId) -> Vec<HashtagId> {
        self.project_hashtags
            .iter()
            .filter(|(owner, _)| *owner == project)
            .map(|(_, hashtag)| *hashtag)
            .collect()
    }

    fn project_ids_where(&self, matches: impl Fn(&ProjectId) -> bool) -> Vec<ProjectId> {
        self.projects.keys().copied().filter(|id| matches(id)).collect()
    }
}

/// Transaction handle of [`InMemoryCatalogueStore`].
pub struct InMemoryTx {
    committed: OwnedMutexGuard<CatalogueTables>,
    working: CatalogueTables,
}

/// Transactional in-memory implementation of the store ports.
///
/// Ids come from one sequence shared by every table, mirroring serial
/// columns closely enough for ordering assertions.
#[derive(Default)]
pub struct InMemoryCatalogueStore {
    tables: Arc<AsyncMutex<CatalogueTables>>,
    failures: Mutex<HashSet<StoreOperation>>,
    journal: Journal,
}

impl InMemoryCatalogueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share `journal` with other doubles to assert cross-port ordering.
    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    /// Make every later call of `operation` fail with a query error.
    pub fn fail_on(&self, operation: StoreOperation) {
        lock(&self.failures).insert(operation);
    }

    /// Committed state of every table.
    pub async fn tables(&self) -> CatalogueTables {
        self.tables.lock().await.clone()
    }

    pub async fn seed_user(&self, name: &str) -> User {
        let mut tables = self.tables.lock().await;
        let user = User {
            id: UserId::new(tables.allocate_id()),
            name: name.to_owned(),
            created_at: fixed_instant(),
        };
        tables.users.insert(user.id, user.clone());
        user
    }

    pub async fn seed_hashtag(&self, name: &str) -> Hashtag {
        let mut tables = self.tables.lock().await;
        let hashtag = Hashtag {
            id: HashtagId::new(tables.allocate_id()),
            name: name.to_owned(),
            created_at: fixed_instant(),
        };
        tables.hashtags.insert(hashtag.id, hashtag.clone());
        hashtag
    }

    pub async fn seed_project(&self, name: &str, slug: &str) -> Project {
        let mut tables = self.tables.lock().await;
        let project = Project {
            id: ProjectId::new(tables.allocate_id()),
            name: name.to_owned(),
            slug: slug.to_owned(),
            description: String::new(),
            created_at: fixed_instant(),
        };
        tables.projects.insert(project.id, project.clone());
        project
    }

    pub async fn seed_user_link(&self, project: ProjectId, user: UserId) {
        self.tables.lock().await.user_projects.insert((project, user));
    }

    pub async fn seed_hashtag_link(&self, project: ProjectId, hashtag: HashtagId) {
        self.tables
            .lock()
            .await
            .project_hashtags
            .insert((project, hashtag));
    }

    fn check(&self, operation: StoreOperation) -> Result<(), StoreError> {
        self.journal.record(JournalEntry::Store(operation));
        if lock(&self.failures).contains(&operation) {
            return Err(StoreError::query(format!(
                "injected failure in {}",
                operation.as_str()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl CatalogueTransactions for InMemoryCatalogueStore {
    type Tx = InMemoryTx;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        if lock(&self.failures).contains(&StoreOperation::Begin) {
            return Err(StoreError::connection("injected failure in begin"));
        }
        let committed = Arc::clone(&self.tables).lock_owned().await;
        let working = committed.clone();
        self.journal.record(JournalEntry::Store(StoreOperation::Begin));
        Ok(InMemoryTx { committed, working })
    }

    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError> {
        self.check(StoreOperation::Commit)?;
        let InMemoryTx {
            mut committed,
            working,
        } = tx;
        *committed = working;
        self.journal.record(JournalEntry::Committed);
        Ok(())
    }

    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError> {
        drop(tx);
        self.journal.record(JournalEntry::RolledBack);
        Ok(())
    }
}

#[async_trait]
impl EntityStore for InMemoryCatalogueStore {
    async fn insert_user(
        &self,
        tx: &mut Self::Tx,
        draft: &UserDraft,
        created_at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        self.check(StoreOperation::InsertUser)?;
        let user = User {
            id: UserId::new(tx.working.allocate_id()),
            name: draft.name().to_owned(),
            created_at,
        };
        tx.working.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<Option<User>, StoreError> {
        self.check(StoreOperation::FindUser)?;
        Ok(tx.working.users.get(&id).cloned())
    }

    async fn update_user(&self, tx: &mut Self::Tx, user: &User) -> Result<(), StoreError> {
        self.check(StoreOperation::UpdateUser)?;
        if let Some(row) = tx.working.users.get_mut(&user.id) {
            row.name.clone_from(&user.name);
        }
        Ok(())
    }

    async fn delete_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StoreError> {
        self.check(StoreOperation::DeleteUser)?;
        tx.working.users.remove(&id);
        Ok(())
    }

    async fn user_exists(&self, tx: &mut Self::Tx, id: UserId) -> Result<bool, StoreError> {
        self.check(StoreOperation::UserExists)?;
        Ok(tx.working.users.contains_key(&id))
    }

    async fn insert_hashtag(
        &self,
        tx: &mut Self::Tx,
        draft: &HashtagDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Hashtag, StoreError> {
        self.check(StoreOperation::InsertHashtag)?;
        let hashtag = Hashtag {
            id: HashtagId::new(tx.working.allocate_id()),
            name: draft.name().to_owned(),
            created_at,
        };
        tx.working.hashtags.insert(hashtag.id, hashtag.clone());
        Ok(hashtag)
    }

    async fn find_hashtag(
        &self,
        tx: &mut Self::Tx,
        id: HashtagId,
    ) -> Result<Option<Hashtag>, StoreError> {
        self.check(StoreOperation::FindHashtag)?;
        Ok(tx.working.hashtags.get(&id).cloned())
    }

    async fn update_hashtag(&self, tx: &mut Self::Tx, hashtag: &Hashtag) -> Result<(), StoreError> {
        self.check(StoreOperation::UpdateHashtag)?;
        if let Some(row) = tx.working.hashtags.get_mut(&hashtag.id) {
            row.name.clone_from(&hashtag.name);
        }
        Ok(())
    }

    async fn delete_hashtag(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<(), StoreError> {
        self.check(StoreOperation::DeleteHashtag)?;
        tx.working.hashtags.remove(&id);
        Ok(())
    }

    async fn hashtag_exists(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<bool, StoreError> {
        self.check(StoreOperation::HashtagExists)?;
        Ok(tx.working.hashtags.contains_key(&id))
    }

    async fn insert_project(
        &self,
        tx: &mut Self::Tx,
        draft: &ProjectDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Project, StoreError> {
        self.check(StoreOperation::InsertProject)?;
        let project = Project {
            id: ProjectId::new(tx.working.allocate_id()),
            name: draft.name().to_owned(),
            slug: draft.slug().to_owned(),
            description: draft.description().to_owned(),
            created_at,
        };
        tx.working.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn find_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Option<Project>, StoreError> {
        self.check(StoreOperation::FindProject)?;
        Ok(tx.working.projects.get(&id).cloned())
    }

    async fn update_project(&self, tx: &mut Self::Tx, project: &Project) -> Result<(), StoreError> {
        self.check(StoreOperation::UpdateProject)?;
        if let Some(row) = tx.working.projects.get_mut(&project.id) {
            row.name.clone_from(&project.name);
            row.slug.clone_from(&project.slug);
            row.description.clone_from(&project.description);
        }
        Ok(())
    }

    async fn delete_project(&self, tx: &mut Self::Tx, id: ProjectId) -> Result<(), StoreError> {
        self.check(StoreOperation::DeleteProject)?;
        tx.working.projects.remove(&id);
        Ok(())
    }

    async fn project_exists(&self, tx: &mut Self::Tx, id: ProjectId) -> Result<bool, StoreError> {
        self.check(StoreOperation::ProjectExists)?;
        Ok(tx.working.projects.contains_key(&id))
    }

    async fn list_projects(&self, tx: &mut Self::Tx) -> Result<Vec<Project>, StoreError> {
        self.check(StoreOperation::ListProjects)?;
        Ok(tx.working.projects.values().cloned().collect())
    }
}

#[async_trait]
impl AssociationStore for InMemoryCatalogueStore {
    async fn project_ids_for_user(
        &self,
        tx: &mut Self::Tx,
        id: UserId,
    ) -> Result<Vec<ProjectId>, StoreError> {
        self.check(StoreOperation::ProjectIdsForUser)?;
        let links = &tx.working.user_projects;
        Ok(tx
            .working
            .project_ids_where(|project| links.contains(&(*project, id))))
    }

    async fn project_ids_for_hashtag(
        &self,
        tx: &mut Self::Tx,
        id: HashtagId,
    ) -> Result<Vec<ProjectId>, StoreError> {
        self.check(StoreOperation::ProjectIdsForHashtag)?;
        let links = &tx.working.project_hashtags;
        Ok(tx
            .working
            .project_ids_where(|project| links.contains(&(*project, id))))
    }

    async fn user_ids_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<UserId>, StoreError> {
        self.check(StoreOperation::UserIdsForProject)?;
        Ok(tx.working.user_ids_for(id))
    }

    async fn hashtag_ids_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<HashtagId>, StoreError> {
        self.check(StoreOperation::HashtagIdsForProject)?;
        Ok(tx.working.hashtag_ids_for(id))
    }

    async fn users_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<User>, StoreError> {
        self.check(StoreOperation::UsersForProject)?;
        Ok(tx
            .working
            .user_ids_for(id)
            .into_iter()
            .filter_map(|user| tx.working.users.get(&user).cloned())
            .collect())
    }

    async fn hashtags_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<Hashtag>, StoreError> {
        self.check(StoreOperation::HashtagsForProject)?;
        Ok(tx
            .working
            .hashtag_ids_for(id)
            .into_iter()
            .filter_map(|hashtag| tx.working.hashtags.get(&hashtag).cloned())
            .collect())
    }

    async fn clear_project_links(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<(), StoreError> {
        self.check(StoreOperation::ClearProjectLinks)?;
        tx.working.user_projects.retain(|(project, _)| *project != id);
        tx.working
            .project_hashtags
            .retain(|(project, _)| *project != id);
        Ok(())
    }

    async fn link_project_users(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
        user_ids: &[UserId],
    ) -> Result<(), StoreError> {
        self.check(StoreOperation::LinkProjectUsers)?;
        tx.working
            .user_projects
            .extend(user_ids.iter().map(|user| (id, *user)));
        Ok(())
    }

    async fn link_project_hashtags(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
        hashtag_ids: &[HashtagId],
    ) -> Result<(), StoreError> {
        self.check(StoreOperation::LinkProjectHashtags)?;
        tx.working
            .project_hashtags
            .extend(hashtag_ids.iter().map(|hashtag| (id, *hashtag)));
        Ok(())
    }

    async fn unlink_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StoreError> {
        self.check(StoreOperation::UnlinkUser)?;
        tx.working.user_projects.retain(|(_, user)| *user != id);
        Ok(())
    }

    async fn unlink_hashtag(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<(), StoreError> {
        self.check(StoreOperation::UnlinkHashtag)?;
        tx.working
            .project_hashtags
            .retain(|(_, hashtag)| *hashtag != id);
        Ok(())
    }
}

/// Channel double that decodes and keeps every published message.
#[derive(Default)]
pub struct RecordingSyncChannel {
    published: Mutex<Vec<(OutboundMessage, SyncMessage)>>,
    failure: Mutex<Option<SyncChannelError>>,
    journal: Journal,
}

impl RecordingSyncChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_journal(journal: Journal) -> Self {
        Self {
            journal,
            ..Self::default()
        }
    }

    /// Reject every later publish with `error`.
    pub fn fail_with(&self, error: SyncChannelError) {
        *lock(&self.failure) = Some(error);
    }

    /// Decoded bodies in publish order.
    pub fn messages(&self) -> Vec<SyncMessage> {
        lock(&self.published)
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    /// Raw envelopes in publish order.
    pub fn envelopes(&self) -> Vec<OutboundMessage> {
        lock(&self.published)
            .iter()
            .map(|(envelope, _)| envelope.clone())
            .collect()
    }
}

#[async_trait]
impl SyncChannel for RecordingSyncChannel {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), SyncChannelError> {
        if let Some(error) = lock(&self.failure).clone() {
            return Err(error);
        }
        let decoded: SyncMessage = serde_json::from_slice(&message.body)
            .map_err(|err| SyncChannelError::serialization(err.to_string()))?;
        self.journal.record(JournalEntry::Published {
            project: decoded.doc.id,
            method: decoded.method,
        });
        lock(&self.published).push((message.clone(), decoded));
        Ok(())
    }
}

/// Channel double whose publish never completes.
#[derive(Debug, Clone, Copy, Default)]
pub struct StalledSyncChannel;

#[async_trait]
impl SyncChannel for StalledSyncChannel {
    async fn publish(&self, _message: &OutboundMessage) -> Result<(), SyncChannelError> {
        std::future::pending().await
    }
}

/// Clock pinned to one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Default for FixedClock {
    fn default() -> Self {
        Self(fixed_instant())
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Timestamp used for seeded rows and the default fixed clock.
pub fn fixed_instant() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default()
}
