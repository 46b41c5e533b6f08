//! Project records and their association sets.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::fields::{FieldError, require_non_blank, require_slug};
use super::{HashtagId, ProjectId, UserId};

/// A project row as stored in `projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Store-assigned identifier.
    pub id: ProjectId,
    /// Human readable project name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Free-form description; may be empty.
    pub description: String,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated scalar fields of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    name: String,
    slug: String,
    description: String,
}

impl ProjectDraft {
    /// Validate a project payload.
    ///
    /// The name must not be blank and the slug must consist of lowercase
    /// ASCII letters, digits, and hyphens. The description is free-form.
    ///
    /// # Examples
    /// ```
    /// use fold_backend::domain::ProjectDraft;
    ///
    /// let draft = ProjectDraft::new("fold", "fold", "search sync").expect("valid draft");
    /// assert_eq!(draft.slug(), "fold");
    /// assert!(ProjectDraft::new("fold", "Fold Sync", "").is_err());
    /// ```
    pub fn new(
        name: impl Into<String>,
        slug: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, FieldError> {
        Ok(Self {
            name: require_non_blank("name", name.into())?,
            slug: require_slug(slug.into())?,
            description: description.into(),
        })
    }

    /// Project name.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Project slug.
    pub fn slug(&self) -> &str {
        self.slug.as_str()
    }

    /// Project description.
    pub fn description(&self) -> &str {
        self.description.as_str()
    }
}

/// The complete association state requested for a project.
///
/// Sets rather than lists: link rows carry no quantity, so repeated ids in a
/// payload collapse to a single row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectLinks {
    /// Users to associate with the project.
    pub user_ids: BTreeSet<UserId>,
    /// Hashtags to associate with the project.
    pub hashtag_ids: BTreeSet<HashtagId>,
}

impl ProjectLinks {
    /// Collect association ids from raw payload lists.
    pub fn new(
        user_ids: impl IntoIterator<Item = UserId>,
        hashtag_ids: impl IntoIterator<Item = HashtagId>,
    ) -> Self {
        Self {
            user_ids: user_ids.into_iter().collect(),
            hashtag_ids: hashtag_ids.into_iter().collect(),
        }
    }
}

/// Read model of a project with the ids of its associations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectDetails {
    /// Store-assigned identifier.
    pub id: ProjectId,
    /// Human readable project name.
    pub name: String,
    /// URL-safe identifier.
    pub slug: String,
    /// Free-form description.
    pub description: String,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Associated users in ascending id order.
    pub user_ids: Vec<UserId>,
    /// Associated hashtags in ascending id order.
    pub hashtag_ids: Vec<HashtagId>,
}

impl ProjectDetails {
    /// Combine a project row with its association ids.
    pub fn new(project: Project, user_ids: Vec<UserId>, hashtag_ids: Vec<HashtagId>) -> Self {
        let Project {
            id,
            name,
            slug,
            description,
            created_at,
        } = project;
        Self {
            id,
            name,
            slug,
            description,
            created_at,
            user_ids,
            hashtag_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn links_collapse_duplicate_ids() {
        let links = ProjectLinks::new(
            [UserId::new(2), UserId::new(1), UserId::new(2)],
            [HashtagId::new(5), HashtagId::new(5)],
        );

        assert_eq!(
            links.user_ids.into_iter().collect::<Vec<_>>(),
            vec![UserId::new(1), UserId::new(2)]
        );
        assert_eq!(links.hashtag_ids.len(), 1);
    }

    #[rstest]
    fn draft_rejects_blank_name() {
        let err = ProjectDraft::new(" ", "fold", "").expect_err("blank name");
        assert_eq!(err, FieldError::Blank { field: "name" });
    }

    #[rstest]
    fn draft_allows_empty_description() {
        let draft = ProjectDraft::new("fold", "fold", "").expect("valid draft");
        assert_eq!(draft.description(), "");
    }
}
