//! Driving port for catalogue mutations.
//!
//! Every mutation runs as one unit of work. The cancellation token lets the
//! caller abandon the work before commit, in which case nothing is written
//! and the call reports [`CatalogueError::Cancelled`].

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::{
    CatalogueError, Hashtag, HashtagDraft, HashtagId, ProjectDetails, ProjectDraft, ProjectId,
    ProjectLinks, User, UserDraft, UserId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueCommand: Send + Sync {
    async fn create_user(
        &self,
        draft: UserDraft,
        cancel: &CancellationToken,
    ) -> Result<User, CatalogueError>;

    /// Rename a user and re-sync every project it belongs to.
    async fn update_user(
        &self,
        id: UserId,
        draft: UserDraft,
        cancel: &CancellationToken,
    ) -> Result<User, CatalogueError>;

    /// Re-sync every linked project without the user, then remove its link
    /// rows and the user row.
    async fn delete_user(&self, id: UserId, cancel: &CancellationToken)
    -> Result<(), CatalogueError>;

    async fn create_hashtag(
        &self,
        draft: HashtagDraft,
        cancel: &CancellationToken,
    ) -> Result<Hashtag, CatalogueError>;

    async fn update_hashtag(
        &self,
        id: HashtagId,
        draft: HashtagDraft,
        cancel: &CancellationToken,
    ) -> Result<Hashtag, CatalogueError>;

    async fn delete_hashtag(
        &self,
        id: HashtagId,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogueError>;

    /// Insert a project with exactly the supplied associations and publish
    /// its first snapshot.
    async fn create_project(
        &self,
        draft: ProjectDraft,
        links: ProjectLinks,
        cancel: &CancellationToken,
    ) -> Result<ProjectDetails, CatalogueError>;

    /// Replace the project's fields and associations and publish a fresh
    /// snapshot.
    async fn update_project(
        &self,
        id: ProjectId,
        draft: ProjectDraft,
        links: ProjectLinks,
        cancel: &CancellationToken,
    ) -> Result<ProjectDetails, CatalogueError>;

    /// Publish a delete snapshot, then remove the project and its links.
    async fn delete_project(
        &self,
        id: ProjectId,
        cancel: &CancellationToken,
    ) -> Result<(), CatalogueError>;
}
