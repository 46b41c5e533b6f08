//! Catalogue read service.
//!
//! Reads run in a short transaction that is always rolled back, so they see a
//! consistent view and never dispatch anything.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use super::catalogue_error::{CatalogueError, EntityKind, SyncPhase};
use super::ports::{CatalogueQuery, CatalogueStore};
use super::{Hashtag, HashtagId, Project, ProjectDetails, ProjectId, User, UserId};

/// Read-side counterpart of the catalogue command service.
pub struct CatalogueQueryService<S> {
    store: Arc<S>,
}

impl<S> Clone for CatalogueQueryService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> CatalogueQueryService<S>
where
    S: CatalogueStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    async fn release(&self, tx: S::Tx) {
        if let Err(err) = self.store.rollback(tx).await {
            warn!(error = %err, "failed to release read transaction");
        }
    }

    async fn details(
        &self,
        tx: &mut S::Tx,
        project: Project,
    ) -> Result<ProjectDetails, CatalogueError> {
        let user_ids = self
            .store
            .user_ids_for_project(tx, project.id)
            .await
            .map_err(read_error)?;
        let hashtag_ids = self
            .store
            .hashtag_ids_for_project(tx, project.id)
            .await
            .map_err(read_error)?;
        Ok(ProjectDetails::new(project, user_ids, hashtag_ids))
    }

    async fn project_details(
        &self,
        tx: &mut S::Tx,
        id: ProjectId,
    ) -> Result<ProjectDetails, CatalogueError> {
        let project = self
            .store
            .find_project(tx, id)
            .await
            .map_err(read_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::Project, id))?;
        self.details(tx, project).await
    }

    async fn all_project_details(
        &self,
        tx: &mut S::Tx,
    ) -> Result<Vec<ProjectDetails>, CatalogueError> {
        let projects = self.store.list_projects(tx).await.map_err(read_error)?;
        let mut details = Vec::with_capacity(projects.len());
        for project in projects {
            details.push(self.details(tx, project).await?);
        }
        Ok(details)
    }
}

fn read_error(err: super::ports::StoreError) -> CatalogueError {
    CatalogueError::store(SyncPhase::Started)(err)
}

#[async_trait]
impl<S> CatalogueQuery for CatalogueQueryService<S>
where
    S: CatalogueStore + 'static,
{
    async fn get_user(&self, id: UserId) -> Result<User, CatalogueError> {
        let mut tx = self.store.begin().await.map_err(read_error)?;
        let found = self.store.find_user(&mut tx, id).await;
        self.release(tx).await;
        found
            .map_err(read_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::User, id))
    }

    async fn get_hashtag(&self, id: HashtagId) -> Result<Hashtag, CatalogueError> {
        let mut tx = self.store.begin().await.map_err(read_error)?;
        let found = self.store.find_hashtag(&mut tx, id).await;
        self.release(tx).await;
        found
            .map_err(read_error)?
            .ok_or_else(|| CatalogueError::not_found(EntityKind::Hashtag, id))
    }

    async fn get_project(&self, id: ProjectId) -> Result<ProjectDetails, CatalogueError> {
        let mut tx = self.store.begin().await.map_err(read_error)?;
        let result = self.project_details(&mut tx, id).await;
        self.release(tx).await;
        result
    }

    async fn list_projects(&self) -> Result<Vec<ProjectDetails>, CatalogueError> {
        let mut tx = self.store.begin().await.map_err(read_error)?;
        let result = self.all_project_details(&mut tx).await;
        self.release(tx).await;
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::StoreError;
    use crate::test_support::{InMemoryCatalogueStore, StoreOperation};
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn project_details_list_association_ids() {
        let store = Arc::new(InMemoryCatalogueStore::new());
        let ada = store.seed_user("ada").await;
        let rust = store.seed_hashtag("rust").await;
        let project = store.seed_project("fold", "fold").await;
        store.seed_user_link(project.id, ada.id).await;
        store.seed_hashtag_link(project.id, rust.id).await;
        let service = CatalogueQueryService::new(Arc::clone(&store));

        let details = service.get_project(project.id).await.expect("project");

        assert_eq!(details.user_ids, vec![ada.id]);
        assert_eq!(details.hashtag_ids, vec![rust.id]);
    }

    #[rstest]
    #[tokio::test]
    async fn list_projects_is_ascending() {
        let store = Arc::new(InMemoryCatalogueStore::new());
        let first = store.seed_project("a", "a").await;
        let second = store.seed_project("b", "b").await;
        let service = CatalogueQueryService::new(Arc::clone(&store));

        let listed = service.list_projects().await.expect("list");

        let ids: Vec<_> = listed.iter().map(|project| project.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[rstest]
    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = Arc::new(InMemoryCatalogueStore::new());
        let service = CatalogueQueryService::new(Arc::clone(&store));

        let err = service.get_user(UserId::new(5)).await.expect_err("missing");

        assert_eq!(err, CatalogueError::not_found(EntityKind::User, 5));
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_surface() {
        let store = Arc::new(InMemoryCatalogueStore::new());
        store.fail_on(StoreOperation::FindHashtag);
        let service = CatalogueQueryService::new(Arc::clone(&store));

        let err = service
            .get_hashtag(HashtagId::new(1))
            .await
            .expect_err("failure");

        assert_eq!(
            err,
            CatalogueError::Store {
                phase: SyncPhase::Started,
                source: StoreError::query("injected failure in find_hashtag"),
            }
        );
    }
}
