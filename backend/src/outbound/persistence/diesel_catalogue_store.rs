//! PostgreSQL-backed catalogue store using Diesel ORM.
//!
//! Each transaction owns one pooled connection for its whole lifetime. The
//! transaction is opened with `BEGIN` on checkout and closed only by an
//! explicit commit or rollback from the domain; a handle dropped without
//! either leaves the connection flagged as broken, so the pool discards it
//! instead of reusing a connection with an open transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::debug;

use crate::domain::ports::{AssociationStore, CatalogueTransactions, EntityStore, StoreError};
use crate::domain::{
    Hashtag, HashtagDraft, HashtagId, Project, ProjectDraft, ProjectId, User, UserDraft, UserId,
};

use super::diesel_helpers::{diesel_error, map_pool_error};
use super::models::{
    HashtagRow, NewHashtagRow, NewProjectRow, NewUserRow, ProjectHashtagRow, ProjectRow,
    ProjectUpdate, UserProjectRow, UserRow,
};
use super::pool::{DbPool, OwnedConnection};
use super::schema::{hashtags, project_hashtags, projects, user_projects, users};

/// Open transaction on a dedicated pooled connection.
pub struct DieselTransaction {
    conn: OwnedConnection,
}

impl DieselTransaction {
    fn conn(&mut self) -> &mut AsyncPgConnection {
        &mut self.conn
    }
}

/// Diesel-backed implementation of the catalogue store ports.
#[derive(Clone)]
pub struct DieselCatalogueStore {
    pool: DbPool,
}

impl DieselCatalogueStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogueTransactions for DieselCatalogueStore {
    type Tx = DieselTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let mut conn = self.pool.get_owned().await.map_err(map_pool_error)?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(|err| {
                debug!(error = %err, "failed to open transaction");
                StoreError::connection(format!("begin: {err}"))
            })?;
        Ok(DieselTransaction { conn })
    }

    async fn commit(&self, mut tx: Self::Tx) -> Result<(), StoreError> {
        AnsiTransactionManager::commit_transaction(tx.conn())
            .await
            .map_err(diesel_error("commit"))
    }

    async fn rollback(&self, mut tx: Self::Tx) -> Result<(), StoreError> {
        AnsiTransactionManager::rollback_transaction(tx.conn())
            .await
            .map_err(diesel_error("rollback"))
    }
}

#[async_trait]
impl EntityStore for DieselCatalogueStore {
    async fn insert_user(
        &self,
        tx: &mut Self::Tx,
        draft: &UserDraft,
        created_at: DateTime<Utc>,
    ) -> Result<User, StoreError> {
        diesel::insert_into(users::table)
            .values(&NewUserRow {
                name: draft.name(),
                created_at,
            })
            .returning(UserRow::as_returning())
            .get_result(tx.conn())
            .await
            .map(User::from)
            .map_err(diesel_error("insert_user"))
    }

    async fn find_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<Option<User>, StoreError> {
        users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(tx.conn())
            .await
            .optional()
            .map(|row| row.map(User::from))
            .map_err(diesel_error("find_user"))
    }

    async fn update_user(&self, tx: &mut Self::Tx, user: &User) -> Result<(), StoreError> {
        diesel::update(users::table.find(user.id.get()))
            .set(users::name.eq(&user.name))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("update_user"))
    }

    async fn delete_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StoreError> {
        diesel::delete(users::table.find(id.get()))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("delete_user"))
    }

    async fn user_exists(&self, tx: &mut Self::Tx, id: UserId) -> Result<bool, StoreError> {
        diesel::select(diesel::dsl::exists(users::table.find(id.get())))
            .get_result(tx.conn())
            .await
            .map_err(diesel_error("user_exists"))
    }

    async fn insert_hashtag(
        &self,
        tx: &mut Self::Tx,
        draft: &HashtagDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Hashtag, StoreError> {
        diesel::insert_into(hashtags::table)
            .values(&NewHashtagRow {
                name: draft.name(),
                created_at,
            })
            .returning(HashtagRow::as_returning())
            .get_result(tx.conn())
            .await
            .map(Hashtag::from)
            .map_err(diesel_error("insert_hashtag"))
    }

    async fn find_hashtag(
        &self,
        tx: &mut Self::Tx,
        id: HashtagId,
    ) -> Result<Option<Hashtag>, StoreError> {
        hashtags::table
            .find(id.get())
            .select(HashtagRow::as_select())
            .first(tx.conn())
            .await
            .optional()
            .map(|row| row.map(Hashtag::from))
            .map_err(diesel_error("find_hashtag"))
    }

    async fn update_hashtag(&self, tx: &mut Self::Tx, hashtag: &Hashtag) -> Result<(), StoreError> {
        diesel::update(hashtags::table.find(hashtag.id.get()))
            .set(hashtags::name.eq(&hashtag.name))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("update_hashtag"))
    }

    async fn delete_hashtag(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<(), StoreError> {
        diesel::delete(hashtags::table.find(id.get()))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("delete_hashtag"))
    }

    async fn hashtag_exists(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<bool, StoreError> {
        diesel::select(diesel::dsl::exists(hashtags::table.find(id.get())))
            .get_result(tx.conn())
            .await
            .map_err(diesel_error("hashtag_exists"))
    }

    async fn insert_project(
        &self,
        tx: &mut Self::Tx,
        draft: &ProjectDraft,
        created_at: DateTime<Utc>,
    ) -> Result<Project, StoreError> {
        diesel::insert_into(projects::table)
            .values(&NewProjectRow {
                name: draft.name(),
                slug: draft.slug(),
                description: draft.description(),
                created_at,
            })
            .returning(ProjectRow::as_returning())
            .get_result(tx.conn())
            .await
            .map(Project::from)
            .map_err(diesel_error("insert_project"))
    }

    async fn find_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Option<Project>, StoreError> {
        projects::table
            .find(id.get())
            .select(ProjectRow::as_select())
            .first(tx.conn())
            .await
            .optional()
            .map(|row| row.map(Project::from))
            .map_err(diesel_error("find_project"))
    }

    async fn update_project(&self, tx: &mut Self::Tx, project: &Project) -> Result<(), StoreError> {
        diesel::update(projects::table.find(project.id.get()))
            .set(&ProjectUpdate {
                name: &project.name,
                slug: &project.slug,
                description: &project.description,
            })
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("update_project"))
    }

    async fn delete_project(&self, tx: &mut Self::Tx, id: ProjectId) -> Result<(), StoreError> {
        diesel::delete(projects::table.find(id.get()))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("delete_project"))
    }

    async fn project_exists(&self, tx: &mut Self::Tx, id: ProjectId) -> Result<bool, StoreError> {
        diesel::select(diesel::dsl::exists(projects::table.find(id.get())))
            .get_result(tx.conn())
            .await
            .map_err(diesel_error("project_exists"))
    }

    async fn list_projects(&self, tx: &mut Self::Tx) -> Result<Vec<Project>, StoreError> {
        let rows: Vec<ProjectRow> = projects::table
            .order(projects::id.asc())
            .select(ProjectRow::as_select())
            .load(tx.conn())
            .await
            .map_err(diesel_error("list_projects"))?;
        Ok(rows.into_iter().map(Project::from).collect())
    }
}

#[async_trait]
impl AssociationStore for DieselCatalogueStore {
    async fn project_ids_for_user(
        &self,
        tx: &mut Self::Tx,
        id: UserId,
    ) -> Result<Vec<ProjectId>, StoreError> {
        let ids: Vec<i32> = user_projects::table
            .filter(user_projects::user_id.eq(id.get()))
            .select(user_projects::project_id)
            .distinct()
            .order(user_projects::project_id.asc())
            .load(tx.conn())
            .await
            .map_err(diesel_error("project_ids_for_user"))?;
        Ok(ids.into_iter().map(ProjectId::new).collect())
    }

    async fn project_ids_for_hashtag(
        &self,
        tx: &mut Self::Tx,
        id: HashtagId,
    ) -> Result<Vec<ProjectId>, StoreError> {
        let ids: Vec<i32> = project_hashtags::table
            .filter(project_hashtags::hashtag_id.eq(id.get()))
            .select(project_hashtags::project_id)
            .distinct()
            .order(project_hashtags::project_id.asc())
            .load(tx.conn())
            .await
            .map_err(diesel_error("project_ids_for_hashtag"))?;
        Ok(ids.into_iter().map(ProjectId::new).collect())
    }

    async fn user_ids_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<UserId>, StoreError> {
        let ids: Vec<i32> = user_projects::table
            .filter(user_projects::project_id.eq(id.get()))
            .select(user_projects::user_id)
            .order(user_projects::user_id.asc())
            .load(tx.conn())
            .await
            .map_err(diesel_error("user_ids_for_project"))?;
        Ok(ids.into_iter().map(UserId::new).collect())
    }

    async fn hashtag_ids_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<HashtagId>, StoreError> {
        let ids: Vec<i32> = project_hashtags::table
            .filter(project_hashtags::project_id.eq(id.get()))
            .select(project_hashtags::hashtag_id)
            .order(project_hashtags::hashtag_id.asc())
            .load(tx.conn())
            .await
            .map_err(diesel_error("hashtag_ids_for_project"))?;
        Ok(ids.into_iter().map(HashtagId::new).collect())
    }

    async fn users_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<User>, StoreError> {
        let rows: Vec<UserRow> = users::table
            .inner_join(user_projects::table)
            .filter(user_projects::project_id.eq(id.get()))
            .order(users::id.asc())
            .select(UserRow::as_select())
            .load(tx.conn())
            .await
            .map_err(diesel_error("users_for_project"))?;
        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn hashtags_for_project(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<Vec<Hashtag>, StoreError> {
        let rows: Vec<HashtagRow> = hashtags::table
            .inner_join(project_hashtags::table)
            .filter(project_hashtags::project_id.eq(id.get()))
            .order(hashtags::id.asc())
            .select(HashtagRow::as_select())
            .load(tx.conn())
            .await
            .map_err(diesel_error("hashtags_for_project"))?;
        Ok(rows.into_iter().map(Hashtag::from).collect())
    }

    async fn clear_project_links(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
    ) -> Result<(), StoreError> {
        diesel::delete(user_projects::table.filter(user_projects::project_id.eq(id.get())))
            .execute(tx.conn())
            .await
            .map_err(diesel_error("clear_project_links"))?;
        diesel::delete(project_hashtags::table.filter(project_hashtags::project_id.eq(id.get())))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("clear_project_links"))
    }

    async fn link_project_users(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
        user_ids: &[UserId],
    ) -> Result<(), StoreError> {
        let rows: Vec<UserProjectRow> = user_ids
            .iter()
            .map(|user| UserProjectRow {
                project_id: id.get(),
                user_id: user.get(),
            })
            .collect();
        diesel::insert_into(user_projects::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("link_project_users"))
    }

    async fn link_project_hashtags(
        &self,
        tx: &mut Self::Tx,
        id: ProjectId,
        hashtag_ids: &[HashtagId],
    ) -> Result<(), StoreError> {
        let rows: Vec<ProjectHashtagRow> = hashtag_ids
            .iter()
            .map(|hashtag| ProjectHashtagRow {
                hashtag_id: hashtag.get(),
                project_id: id.get(),
            })
            .collect();
        diesel::insert_into(project_hashtags::table)
            .values(&rows)
            .on_conflict_do_nothing()
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("link_project_hashtags"))
    }

    async fn unlink_user(&self, tx: &mut Self::Tx, id: UserId) -> Result<(), StoreError> {
        diesel::delete(user_projects::table.filter(user_projects::user_id.eq(id.get())))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("unlink_user"))
    }

    async fn unlink_hashtag(&self, tx: &mut Self::Tx, id: HashtagId) -> Result<(), StoreError> {
        diesel::delete(project_hashtags::table.filter(project_hashtags::hashtag_id.eq(id.get())))
            .execute(tx.conn())
            .await
            .map(drop)
            .map_err(diesel_error("unlink_hashtag"))
    }
}
