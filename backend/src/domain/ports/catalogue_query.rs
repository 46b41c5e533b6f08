//! Driving port for catalogue reads.
use async_trait::async_trait;

use crate::domain::{
    CatalogueError, Hashtag, HashtagId, ProjectDetails, ProjectId, User, UserId,
};

/// Read-only access to catalogue entities. Reads never publish.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    async fn get_user(&self, id: UserId) -> Result<User, CatalogueError>;
    async fn get_hashtag(&self, id: HashtagId) -> Result<Hashtag, CatalogueError>;
    async fn get_project(&self, id: ProjectId) -> Result<ProjectDetails, CatalogueError>;
    /// Every project in ascending id order.
    async fn list_projects(&self) -> Result<Vec<ProjectDetails>, CatalogueError>;
}
