//! Catalogue user records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;
use super::fields::{FieldError, require_non_blank};

/// A user row as stored in `users`.
///
/// Serialises with the snake_case keys the search index expects
/// (`id`, `name`, `created_at`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Store-assigned identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated mutable fields of a user.
///
/// Used both for inserts and for full-field replace updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDraft {
    name: String,
}

impl UserDraft {
    /// Validate a user payload.
    ///
    /// # Examples
    /// ```
    /// use fold_backend::domain::UserDraft;
    ///
    /// let draft = UserDraft::new("Ada").expect("valid name");
    /// assert_eq!(draft.name(), "Ada");
    /// assert!(UserDraft::new("  ").is_err());
    /// ```
    pub fn new(name: impl Into<String>) -> Result<Self, FieldError> {
        Ok(Self {
            name: require_non_blank("name", name.into())?,
        })
    }

    /// Display name to store.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}
