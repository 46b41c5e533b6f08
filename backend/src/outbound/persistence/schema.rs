//! Diesel table definitions for the catalogue schema.
//!
//! These definitions must match `migrations/*_create_catalogue/up.sql`
//! exactly. When the migration changes, update this file to match; the
//! `diesel print-schema` command can generate it from a live database.

diesel::table! {
    /// Catalogue users.
    users (id) {
        id -> Int4,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Hashtags that can be attached to projects.
    hashtags (id) {
        id -> Int4,
        name -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    projects (id) {
        id -> Int4,
        name -> Varchar,
        slug -> Varchar,
        description -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Project to hashtag links; one row per pair.
    project_hashtags (project_id, hashtag_id) {
        hashtag_id -> Int4,
        project_id -> Int4,
    }
}

diesel::table! {
    /// Project to user links; one row per pair.
    user_projects (project_id, user_id) {
        project_id -> Int4,
        user_id -> Int4,
    }
}

diesel::joinable!(project_hashtags -> hashtags (hashtag_id));
diesel::joinable!(project_hashtags -> projects (project_id));
diesel::joinable!(user_projects -> projects (project_id));
diesel::joinable!(user_projects -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    hashtags,
    project_hashtags,
    projects,
    user_projects,
    users,
);
