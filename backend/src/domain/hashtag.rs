//! Hashtag records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::HashtagId;
use super::fields::{FieldError, require_non_blank};

/// A hashtag row as stored in `hashtags`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hashtag {
    /// Store-assigned identifier.
    pub id: HashtagId,
    /// Label without the leading `#`.
    pub name: String,
    /// Insert timestamp.
    pub created_at: DateTime<Utc>,
}

/// Validated mutable fields of a hashtag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashtagDraft {
    name: String,
}

impl HashtagDraft {
    /// Validate a hashtag payload; the label must not be blank.
    pub fn new(name: impl Into<String>) -> Result<Self, FieldError> {
        Ok(Self {
            name: require_non_blank("name", name.into())?,
        })
    }

    /// Label to store.
    pub fn name(&self) -> &str {
        self.name.as_str()
    }
}
