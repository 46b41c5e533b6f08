//! Catalogue command service.
//!
//! Every use case runs as one unit of work on one store transaction:
//! validate, mutate, rebuild the snapshot of each affected project, publish
//! it, and commit only if all of that succeeded. Any failure, including a
//! rejected publish or a cancelled caller, rolls the transaction back and is
//! returned unchanged.
//!
//! Resync targets are resolved before the link rows they depend on are
//! removed, and fan-out walks projects in ascending id order.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::association_resolver::{AssociationResolver, LinkedEntity};
use super::catalogue_error::{CatalogueError, EntityKind, SyncPhase};
use super::ports::{CatalogueCommand, CatalogueStore, StoreError};
use super::snapshot_builder::SnapshotBuilder;
use super::sync_dispatcher::SyncDispatcher;
use super::{
    Hashtag, HashtagDraft, HashtagId, Project, ProjectDetails, ProjectDraft, ProjectId,
    ProjectLinks, SyncMethod, User, UserDraft, UserId,
};

/// Tracks the phase a unit of work has reached.
struct Progress {
    use_case: &'static str,
    phase: SyncPhase,
}

impl Progress {
    fn new(use_case: &'static str) -> Self {
        debug!(use_case, phase = %SyncPhase::Started, "unit of work started");
        Self {
            use_case,
            phase: SyncPhase::Started,
        }
    }

    fn enter(&mut self, phase: SyncPhase) {
        if self.phase != phase {
            debug!(use_case = self.use_case, from = %self.phase, to = %phase, "phase transition");
            self.phase = phase;
        }
    }

    fn store_error(&self) -> impl FnOnce(StoreError) -> CatalogueError + use<> {
        CatalogueError::store(self.phase)
    }
}

/// Race `work` against the caller's cancellation token.
async fn until_cancelled<T>(
    cancel: &CancellationToken,
    work: impl Future<Output = Result<T, CatalogueError>>,
) -> Result<T, CatalogueError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(CatalogueError::Cancelled),
        result = work => result,
    }
}

/// Orchestrates catalogue mutations and their search sync.
pub struct CatalogueService<S> {
    store: Arc<S>,
    resolver: AssociationResolver<S>,
    snapshots: SnapshotBuilder<S>,
    dispatcher: SyncDispatcher,
    clock: Arc<dyn Clock>,
}

impl<S> Clone for CatalogueService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            resolver: self.resolver.clone(),
            snapshots: self.snapshots.clone(),
            dispatcher: self.dispatcher.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<S> CatalogueService<S>
where
    S: CatalogueStore,
{
    pub fn new(store: Arc<S>, dispatcher: SyncDispatcher, clock: Arc<dyn Clock>) -> Self {
        Self {
            resolver: AssociationResolver::new(Arc::clone(&store)),
            snapshots: SnapshotBuilder::new(Arc::clone(&store)),
            store,
            dispatcher,
            clock,
        }
    }

    /// Open the transaction for one use case.
    async fn open(
        &self,
        use_case: &'static str,
        cancel: &CancellationToken,
    ) -> Result<(S::Tx, Progress), CatalogueError> {
        if cancel.is_cancelled() {
            return Err(CatalogueError::Cancelled);
        }
        let progress = Progress::new(use_case);
        let tx = self
            .store
            .begin()
            .await
            .map_err(progress.store_error())?;
        Ok((tx, progress))
    }

    /// Commit on success, roll back on failure or late cancellation.
    async fn settle<T>(
        &self,
        tx: S::Tx,
        progress: Progress,
        outcome: Result<T, CatalogueError>,
        cancel: &CancellationToken,
    ) -> Result<T, CatalogueError> {
        let use_case = progress.use_case;
        let outcome = match outcome {
            Ok(_) if cancel.is_cancelled() => Err(CatalogueError::Cancelled),
            other => other,
        };

        match outcome {
            Ok(value) => {
                self.store
                    .commit(tx)
                    .await
                    .map_err(progress.store_error())?;
                debug!(use_case, from = %progress.phase, to = %SyncPhase::Committed, "phase transition");
                info!(use_case, "catalogue change committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.store.rollback(tx).await {
                    warn!(use_case, error = %rollback_err, "rollback failed");
                }
                debug!(use_case, from = %progress.phase, to = %SyncPhase::RolledBack, "phase transition");
                warn!(use_case, phase = %progress.phase, error = %err, "catalogue change rolled back");
                Err(err)
            }
        }
    }

    /// Build and publish one upsert snapshot per target, first failure wins.
    async fn resync(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        targets: &[ProjectId],
        departing: Option<LinkedEntity>,
    ) -> Result<(), CatalogueError> {
        for project in targets {
            progress.enter(SyncPhase::Denormalizing);
            let message = self
                .snapshots
                .build_excluding(tx, *project, SyncMethod::Upsert, departing)
                .await?;
            progress.enter(SyncPhase::Publishing);
            self.dispatcher.dispatch(&message).await?;
        }
        Ok(())
    }

    async fn create_user_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        draft: &UserDraft,
    ) -> Result<User, CatalogueError> {
        progress.enter(SyncPhase::Mutating);
        self.store
            .insert_user(tx, draft, self.clock.utc())
            .await
            .map_err(progress.store_error())
    }

    async fn update_user_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        id: UserId,
        draft: &UserDraft,
    ) -> Result<User, CatalogueError> {
        progress.enter(SyncPhase::Validating);
        let existing = self
            .store
            .find_user(tx, id)
            .await
            .map_err(progress.store_error())?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::User, id))?;

        progress.enter(SyncPhase::Mutating);
        let user = User {
            name: draft.name().to_owned(),
            ..existing
        };
        self.store
            .update_user(tx, &user)
            .await
            .map_err(progress.store_error())?;
        let targets = self
            .resolver
            .affected_project_ids(tx, LinkedEntity::User(id))
            .await
            .map_err(progress.store_error())?;

        self.resync(tx, progress, &targets, None).await?;
        Ok(user)
    }

    async fn delete_user_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        id: UserId,
    ) -> Result<(), CatalogueError> {
        progress.enter(SyncPhase::Validating);
        if !self
            .store
            .user_exists(tx, id)
            .await
            .map_err(progress.store_error())?
        {
            return Err(CatalogueError::not_found(EntityKind::User, id));
        }
        let departing = LinkedEntity::User(id);
        let targets = self
            .resolver
            .affected_project_ids(tx, departing)
            .await
            .map_err(progress.store_error())?;

        self.resync(tx, progress, &targets, Some(departing)).await?;

        progress.enter(SyncPhase::Mutating);
        self.store
            .unlink_user(tx, id)
            .await
            .map_err(progress.store_error())?;
        self.store
            .delete_user(tx, id)
            .await
            .map_err(progress.store_error())
    }

    async fn create_hashtag_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        draft: &HashtagDraft,
    ) -> Result<Hashtag, CatalogueError> {
        progress.enter(SyncPhase::Mutating);
        self.store
            .insert_hashtag(tx, draft, self.clock.utc())
            .await
            .map_err(progress.store_error())
    }

    async fn update_hashtag_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        id: HashtagId,
        draft: &HashtagDraft,
    ) -> Result<Hashtag, CatalogueError> {
        progress.enter(SyncPhase::Validating);
        let existing = self
            .store
            .find_hashtag(tx, id)
            .await
            .map_err(progress.store_error())?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::Hashtag, id))?;

        progress.enter(SyncPhase::Mutating);
        let hashtag = Hashtag {
            name: draft.name().to_owned(),
            ..existing
        };
        self.store
            .update_hashtag(tx, &hashtag)
            .await
            .map_err(progress.store_error())?;
        let targets = self
            .resolver
            .affected_project_ids(tx, LinkedEntity::Hashtag(id))
            .await
            .map_err(progress.store_error())?;

        self.resync(tx, progress, &targets, None).await?;
        Ok(hashtag)
    }

    async fn delete_hashtag_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        id: HashtagId,
    ) -> Result<(), CatalogueError> {
        progress.enter(SyncPhase::Validating);
        if !self
            .store
            .hashtag_exists(tx, id)
            .await
            .map_err(progress.store_error())?
        {
            return Err(CatalogueError::not_found(EntityKind::Hashtag, id));
        }
        let departing = LinkedEntity::Hashtag(id);
        let targets = self
            .resolver
            .affected_project_ids(tx, departing)
            .await
            .map_err(progress.store_error())?;

        self.resync(tx, progress, &targets, Some(departing)).await?;

        progress.enter(SyncPhase::Mutating);
        self.store
            .unlink_hashtag(tx, id)
            .await
            .map_err(progress.store_error())?;
        self.store
            .delete_hashtag(tx, id)
            .await
            .map_err(progress.store_error())
    }

    async fn create_project_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        draft: &ProjectDraft,
        links: &ProjectLinks,
    ) -> Result<ProjectDetails, CatalogueError> {
        progress.enter(SyncPhase::Validating);
        self.resolver.validate_references(tx, links).await?;

        progress.enter(SyncPhase::Mutating);
        let project = self
            .store
            .insert_project(tx, draft, self.clock.utc())
            .await
            .map_err(progress.store_error())?;
        self.resolver
            .replace_project_associations(tx, project.id, links)
            .await
            .map_err(progress.store_error())?;

        self.resync(tx, progress, &[project.id], None).await?;
        Ok(details_from_links(project, links))
    }

    async fn update_project_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        id: ProjectId,
        draft: &ProjectDraft,
        links: &ProjectLinks,
    ) -> Result<ProjectDetails, CatalogueError> {
        progress.enter(SyncPhase::Validating);
        let existing = self
            .store
            .find_project(tx, id)
            .await
            .map_err(progress.store_error())?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::Project, id))?;
        self.resolver.validate_references(tx, links).await?;

        progress.enter(SyncPhase::Mutating);
        let project = Project {
            name: draft.name().to_owned(),
            slug: draft.slug().to_owned(),
            description: draft.description().to_owned(),
            ..existing
        };
        self.store
            .update_project(tx, &project)
            .await
            .map_err(progress.store_error())?;
        self.resolver
            .replace_project_associations(tx, id, links)
            .await
            .map_err(progress.store_error())?;

        self.resync(tx, progress, &[id], None).await?;
        Ok(details_from_links(project, links))
    }

    async fn delete_project_steps(
        &self,
        tx: &mut S::Tx,
        progress: &mut Progress,
        id: ProjectId,
    ) -> Result<(), CatalogueError> {
        progress.enter(SyncPhase::Validating);
        if !self
            .store
            .project_exists(tx, id)
            .await
            .map_err(progress.store_error())?
        {
            return Err(CatalogueError::not_found(EntityKind::Project, id));
        }

        progress.enter(SyncPhase::Denormalizing);
        let message = self.snapshots.build(tx, id, SyncMethod::Delete).await?;
        progress.enter(SyncPhase::Publishing);
        self.dispatcher.dispatch(&message).await?;

        progress.enter(SyncPhase::Mutating);
        self.store
            .clear_project_links(tx, id)
            .await
            .map_err(progress.store_error())?;
        self.store
            .delete_project(tx, id)
            .await
            .map_err(progress.store_error())
    }
}

fn details_from_links(project: Project, links: &ProjectLinks) -> ProjectDetails {
    ProjectDetails::new(
        project,
        links.user_ids.iter().copied().collect(),
        links.hashtag_ids.iter().copied().collect(),
    )
}

#[async_trait]
impl<S> CatalogueCommand for CatalogueService<S>
where
    S: CatalogueStore + 'static,
{
    async fn create_user(
        &self,
        draft: UserDraft,
        cancel: &CancellationToken,
    ) -> Result<User, CatalogueError> {
        let (mut tx, mut progress) = self.open("create_user", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.create_user_steps(&mut tx, &mut progress, &draft),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn update_user(
        &self,
        id: UserId,
        draft: UserDraft,
        cancel: &CancellationToken,
    ) -> Result<User, CatalogueError> {
        let (mut tx, mut progress) = self.open("update_user", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.update_user_steps(&mut tx, &mut progress, id, &draft),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn delete_user(
        &self,
        id: UserId,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogueError> {
        let (mut tx, mut progress) = self.open("delete_user", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.delete_user_steps(&mut tx, &mut progress, id),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn create_hashtag(
        &self,
        draft: HashtagDraft,
        cancel: &CancellationToken,
    ) -> Result<Hashtag, CatalogueError> {
        let (mut tx, mut progress) = self.open("create_hashtag", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.create_hashtag_steps(&mut tx, &mut progress, &draft),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn update_hashtag(
        &self,
        id: HashtagId,
        draft: HashtagDraft,
        cancel: &CancellationToken,
    ) -> Result<Hashtag, CatalogueError> {
        let (mut tx, mut progress) = self.open("update_hashtag", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.update_hashtag_steps(&mut tx, &mut progress, id, &draft),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn delete_hashtag(
        &self,
        id: HashtagId,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogueError> {
        let (mut tx, mut progress) = self.open("delete_hashtag", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.delete_hashtag_steps(&mut tx, &mut progress, id),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn create_project(
        &self,
        draft: ProjectDraft,
        links: ProjectLinks,
        cancel: &CancellationToken,
    ) -> Result<ProjectDetails, CatalogueError> {
        let (mut tx, mut progress) = self.open("create_project", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.create_project_steps(&mut tx, &mut progress, &draft, &links),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn update_project(
        &self,
        id: ProjectId,
        draft: ProjectDraft,
        links: ProjectLinks,
        cancel: &CancellationToken,
    ) -> Result<ProjectDetails, CatalogueError> {
        let (mut tx, mut progress) = self.open("update_project", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.update_project_steps(&mut tx, &mut progress, id, &draft, &links),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }

    async fn delete_project(
        &self,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogueError> {
        let (mut tx, mut progress) = self.open("delete_project", cancel).await?;
        let outcome = until_cancelled(
            cancel,
            self.delete_project_steps(&mut tx, &mut progress, id),
        )
        .await;
        self.settle(tx, progress, outcome, cancel).await
    }
}

#[cfg(test)]
#[path = "catalogue_service_tests.rs"]
mod tests;
