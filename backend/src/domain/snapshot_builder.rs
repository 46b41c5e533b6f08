//! Assembles denormalized project snapshots inside the writing transaction.

use std::sync::Arc;

use super::association_resolver::LinkedEntity;
use super::catalogue_error::{CatalogueError, EntityKind, SyncPhase};
use super::ports::CatalogueStore;
use super::{DenormalizedProject, ProjectId, SyncMessage, SyncMethod};

/// Reads a project and its current associations into a [`SyncMessage`].
pub struct SnapshotBuilder<S> {
    store: Arc<S>,
}

impl<S> Clone for SnapshotBuilder<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> SnapshotBuilder<S>
where
    S: CatalogueStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Build the snapshot of `project` as seen through `tx`.
    ///
    /// Embedded users and hashtags are full records in ascending id order.
    /// A project that has vanished from the transaction's view is reported as
    /// [`CatalogueError::NotFound`].
    pub async fn build(
        &self,
        tx: &mut S::Tx,
        project: ProjectId,
        method: SyncMethod,
    ) -> Result<SyncMessage, CatalogueError> {
        self.build_excluding(tx, project, method, None).await
    }

    /// Build a snapshot that leaves out an entity about to be deleted.
    ///
    /// Used while the departing entity's link rows still exist, so the
    /// indexer receives the project as it will look after commit.
    pub async fn build_excluding(
        &self,
        tx: &mut S::Tx,
        project: ProjectId,
        method: SyncMethod,
        departing: Option<LinkedEntity>,
    ) -> Result<SyncMessage, CatalogueError> {
        let row = self
            .store
            .find_project(tx, project)
            .await
            .map_err(CatalogueError::store(SyncPhase::Denormalizing))?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::Project, project))?;

        let mut users = self
            .store
            .users_for_project(tx, project)
            .await
            .map_err(CatalogueError::store(SyncPhase::Denormalizing))?;
        let mut hashtags = self
            .store
            .hashtags_for_project(tx, project)
            .await
            .map_err(CatalogueError::store(SyncPhase::Denormalizing))?;

        match departing {
            Some(LinkedEntity::User(id)) => users.retain(|user| user.id != id),
            Some(LinkedEntity::Hashtag(id)) => hashtags.retain(|hashtag| hashtag.id != id),
            None => {}
        }
        users.sort_by_key(|user| user.id);
        hashtags.sort_by_key(|hashtag| hashtag.id);

        Ok(SyncMessage {
            doc: DenormalizedProject::new(row, users, hashtags),
            method,
        })
    }
}
