//! Denormalized project documents handed to the search index.
//!
//! A snapshot is never stored in the relational database. It is built inside
//! the transaction that changed the project and serialised straight into the
//! body of a sync message:
//!
//! ```json
//! {"doc": {"id": 7, "name": "fold", "users": [], "hashtags": [...]}, "method": "POST"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Hashtag, Project, ProjectId, User};

/// Ordering key shared by every sync message so the channel delivers all
/// project updates as one strictly ordered stream.
pub const SYNC_ORDERING_KEY: &str = "sync-elastic";

/// Fully expanded view of one project at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenormalizedProject {
    /// Project identifier; also the search document id.
    pub id: ProjectId,
    /// Project name.
    pub name: String,
    /// Project slug.
    pub slug: String,
    /// Project description.
    pub description: String,
    /// Project insert timestamp.
    pub created_at: DateTime<Utc>,
    /// Complete records of every associated user, ascending by id.
    pub users: Vec<User>,
    /// Complete records of every associated hashtag, ascending by id.
    pub hashtags: Vec<Hashtag>,
}

impl DenormalizedProject {
    /// Assemble a snapshot from a project row and its associated records.
    pub fn new(project: Project, users: Vec<User>, hashtags: Vec<Hashtag>) -> Self {
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
            users,
            hashtags,
        }
    }
}

/// Operation the indexer should apply to the document.
///
/// Serialised as the HTTP verb the indexer issues against the search
/// cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncMethod {
    /// Index or re-index the document.
    #[serde(rename = "POST")]
    Upsert,
    /// Remove the document from the index.
    #[serde(rename = "DELETE")]
    Delete,
}

impl SyncMethod {
    /// Wire representation of the method.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upsert => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// Message body published to the sync channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncMessage {
    /// Snapshot of the project.
    pub doc: DenormalizedProject,
    /// Operation to apply downstream.
    pub method: SyncMethod,
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rstest::rstest;
    use serde_json::{Value, json};

    use super::*;
    use crate::domain::HashtagId;

    #[rstest]
    fn message_serialises_with_indexer_field_names() {
        let created_at = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("valid timestamp");
        let project = Project {
            id: ProjectId::new(7),
            name: "fold".to_owned(),
            slug: "fold".to_owned(),
            description: String::new(),
            created_at,
        };
        let hashtag = Hashtag {
            id: HashtagId::new(1),
            name: "golang".to_owned(),
            created_at,
        };
        let message = SyncMessage {
            doc: DenormalizedProject::new(project, Vec::new(), vec![hashtag]),
            method: SyncMethod::Upsert,
        };

        let value: Value = serde_json::to_value(&message).expect("serialise message");

        assert_eq!(value["method"], json!("POST"));
        assert_eq!(value["doc"]["id"], json!(7));
        assert_eq!(value["doc"]["users"], json!([]));
        assert_eq!(value["doc"]["hashtags"][0]["name"], json!("golang"));
        assert_eq!(
            value["doc"]["created_at"],
            json!("2024-01-02T03:04:05Z"),
        );
    }

    #[rstest]
    #[case(SyncMethod::Upsert, "\"POST\"")]
    #[case(SyncMethod::Delete, "\"DELETE\"")]
    fn methods_serialise_as_verbs(#[case] method: SyncMethod, #[case] expected: &str) {
        assert_eq!(serde_json::to_string(&method).expect("serialise"), expected);
        assert_eq!(format!("\"{}\"", method.as_str()), expected);
    }
}
