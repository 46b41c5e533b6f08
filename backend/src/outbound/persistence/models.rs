//! Internal Diesel row structs for the catalogue tables.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain records live next
//! to the row types.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{hashtags, project_hashtags, projects, user_projects, users};
use crate::domain::{Hashtag, HashtagId, Project, ProjectId, User, UserId};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub name: &'a str,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = hashtags)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct HashtagRow {
    pub id: i32,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = hashtags)]
pub(crate) struct NewHashtagRow<'a> {
    pub name: &'a str,
    pub created_at: DateTime<Utc>,
}

impl From<HashtagRow> for Hashtag {
    fn from(row: HashtagRow) -> Self {
        Self {
            id: HashtagId::new(row.id),
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = projects)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProjectRow {
    pub id: i32,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = projects)]
pub(crate) struct NewProjectRow<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Full-field replace of a project's mutable columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = projects)]
pub(crate) struct ProjectUpdate<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        Self {
            id: ProjectId::new(row.id),
            name: row.name,
            slug: row.slug,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = user_projects)]
pub(crate) struct UserProjectRow {
    pub project_id: i32,
    pub user_id: i32,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = project_hashtags)]
pub(crate) struct ProjectHashtagRow {
    pub hashtag_id: i32,
    pub project_id: i32,
}
