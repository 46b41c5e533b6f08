//! Driven ports for transactional access to the catalogue tables.
//!
//! None of these operations opens its own unit of work: every call takes the
//! transaction handle returned by [`CatalogueTransactions::begin`], and the
//! caller decides whether to commit or roll back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::define_port_error;
use crate::domain::{
    Hashtag, HashtagDraft, HashtagId, Project, ProjectDraft, ProjectId, User, UserDraft, UserId,
};

define_port_error! {
    /// Errors raised by relational store adapters.
    pub enum StoreError {
        /// No connection could be acquired or the transaction could not be
        /// opened.
        Connection { message: String } => "store connection failed: {message}",
        /// A statement failed inside an open transaction.
        Query { message: String } => "store query failed: {message}",
    }
}

/// Unit-of-work lifecycle shared by the store ports.
#[async_trait]
pub trait CatalogueTransactions: Send + Sync {
    /// Adapter-specific transaction handle.
    type Tx: Send;

    /// Open a transaction on a dedicated connection.
    async fn begin(&self) -> Result<Self::Tx, StoreError>;

    /// Make every change made through `tx` durable.
    async fn commit(&self, tx: Self::Tx) -> Result<(), StoreError>;

    /// Discard every change made through `tx`.
    async fn rollback(&self, tx: Self::Tx) -> Result<(), StoreError>;
}

/// Typed row access for users, hashtags, and projects.
///
/// Lookups return `Ok(None)` for missing rows; `*_exists` propagates store
/// failures instead of reporting `false`.
#[async_trait]
pub trait EntityStore: CatalogueTransactions {
    async fn insert_user(
        &self,
        tx: &mut Self::Tx,
        draft: &UserDraft,
        created_at: DateTime<Utc>,
    ) -> Result<User, StoreError>;
    async fn find_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<Option<User>, StoreError>;
    /// Replace every mutable column of the row identified by `user.id`.
    async fn update_user(&self, tx: &mut Self::Tx, user: &User) -> Result<(), StoreError>;
    async fn delete_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StoreError>;
    async fn user_exists(&self, tx: &mut Self::Tx, id: UserId) -> Result<bool, StoreError>;

    async fn insert_hashtag(
        &self,
        tx: &mut Self::Tx,
        draft: &HashtagDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Hashtag, StoreError>;
    async fn find_hashtag(
        &self,
        tx: &mut Self::Tx,
        id: HashtagId,
    ) -> Result<Option<Hashtag>, StoreError>;
    async fn update_hashtag(&self, tx: &mut Self::Tx, hashtag: &Hashtag) -> Result<(), StoreError>;
    async fn delete_hashtag(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<(), StoreError>;
    async fn hashtag_exists(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<bool, StoreError>;

    async fn insert_project(
        &self,
        tx: &mut Self::Tx,
        draft: &ProjectDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Project, StoreError>;
    async fn find_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Option<Project>, StoreError>;
    async fn update_project(&self, tx: &mut Self::Tx, project: &Project) -> Result<(), StoreError>;
    async fn delete_project(&self, tx: &mut Self::Tx, id: ProjectId) -> Result<(), StoreError>;
    async fn project_exists(&self, tx: &mut Self::Tx, id: ProjectId) -> Result<bool, StoreError>;
    /// Every project in ascending id order.
    async fn list_projects(&self, tx: &mut Self::Tx) -> Result<Vec<Project>, StoreError>;
}

/// Access to the `user_projects` and `project_hashtags` link tables.
///
/// Every list is returned distinct and in ascending id order.
#[async_trait]
pub trait AssociationStore: CatalogueTransactions {
    async fn project_ids_for_user(
        &self,
        tx: &mut Self::Tx,
        id: UserId,
    ) -> Result<Vec<ProjectId>, StoreError>;
    async fn project_ids_for_hashtag(
        &self,
        tx: &mut Self::Tx,
        id: HashtagId,
    ) -> Result<Vec<ProjectId>, StoreError>;
    async fn user_ids_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<UserId>, StoreError>;
    async fn hashtag_ids_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<HashtagId>, StoreError>;

    /// Full user records linked to the project.
    async fn users_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<User>, StoreError>;
    /// Full hashtag records linked to the project.
    async fn hashtags_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<Hashtag>, StoreError>;

    /// Remove every link row owned by the project, in both link tables.
    async fn clear_project_links(&self, tx: &mut Self::Tx, id: ProjectId)
    -> Result<(), StoreError>;
    async fn link_project_users(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
        user_ids: &[UserId],
    ) -> Result<(), StoreError>;
    async fn link_project_hashtags(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
        hashtag_ids: &[HashtagId],
    ) -> Result<(), StoreError>;

    /// Remove every `user_projects` row referencing the user.
    async fn unlink_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StoreError>;
    /// Remove every `project_hashtags` row referencing the hashtag.
    async fn unlink_hashtag(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<(), StoreError>;
}

/// Everything the catalogue services need from one store.
pub trait CatalogueStore: EntityStore + AssociationStore {}

impl<T> CatalogueStore for T where T: EntityStore + AssociationStore {}
