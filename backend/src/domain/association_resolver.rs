//! Cross-entity lookups and bulk association rewrites.
//!
//! The resolver only ever works inside a transaction handed to it by the
//! caller. It never commits.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::catalogue_error::{CatalogueError, EntityKind, SyncPhase};
use super::ports::{CatalogueStore, StoreError};
use super::{HashtagId, ProjectId, ProjectLinks, UserId};

/// Entity whose project links drive a re-sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkedEntity {
    User(UserId),
    Hashtag(HashtagId),
}

/// Resolves association sets in the opposite direction and rewrites a
/// project's links.
pub struct AssociationResolver<S> {
    store: Arc<S>,
}

impl<S> Clone for AssociationResolver<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> AssociationResolver<S>
where
    S: CatalogueStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Projects currently linked to `entity`, distinct and ascending.
    pub async fn affected_project_ids(
        &self,
        tx: &mut S::Tx,
        entity: LinkedEntity,
    ) -> Result<Vec<ProjectId>, StoreError> {
        let ids = match entity {
            LinkedEntity::User(id) => self.store.project_ids_for_user(tx, id).await?,
            LinkedEntity::Hashtag(id) => self.store.project_ids_for_hashtag(tx, id).await?,
        };
        Ok(ids.into_iter().collect::<BTreeSet<_>>().into_iter().collect())
    }

    /// Delete every link row of the project, then insert the supplied sets.
    pub async fn replace_project_associations(
        &self,
        tx: &mut S::Tx,
        project: ProjectId,
        links: &ProjectLinks,
    ) -> Result<(), StoreError> {
        self.store.clear_project_links(tx, project).await?;

        let user_ids: Vec<UserId> = links.user_ids.iter().copied().collect();
        if !user_ids.is_empty() {
            self.store.link_project_users(tx, project, &user_ids).await?;
        }
        let hashtag_ids: Vec<HashtagId> = links.hashtag_ids.iter().copied().collect();
        if !hashtag_ids.is_empty() {
            self.store
                .link_project_hashtags(tx, project, &hashtag_ids)
                .await?;
        }
        Ok(())
    }

    /// Check that every referenced user and hashtag exists.
    ///
    /// Users are checked before hashtags, each in ascending id order; the
    /// first missing id is reported.
    pub async fn validate_references(
        &self,
        tx: &mut S::Tx,
        links: &ProjectLinks,
    ) -> Result<(), CatalogueError> {
        for id in &links.user_ids {
            let exists = self
                .store
                .user_exists(tx, *id)
                .await
                .map_err(CatalogueError::store(SyncPhase::Validating))?;
            if !exists {
                return Err(CatalogueError::validation(EntityKind::User, *id));
            }
        }
        for id in &links.hashtag_ids {
            let exists = self
                .store
                .hashtag_exists(tx, *id)
                .await
                .map_err(CatalogueError::store(SyncPhase::Validating))?;
            if !exists {
                return Err(CatalogueError::validation(EntityKind::Hashtag, *id));
            }
        }
        Ok(())
    }
}
