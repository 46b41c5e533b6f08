//! Failures surfaced by catalogue use cases.

use std::fmt;

use super::fields::FieldError;
use super::ports::{StoreError, SyncChannelError};

/// Entity families managed by the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Hashtag,
    Project,
}

impl EntityKind {
    /// Lowercase label used in messages and error details.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Hashtag => "hashtag",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Progress of one use case through its unit of work.
///
/// `RolledBack` is absorbing and reachable from every phase before
/// `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Started,
    Validating,
    Mutating,
    Denormalizing,
    Publishing,
    Committed,
    RolledBack,
}

impl SyncPhase {
    /// Stable label for logs and error details.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::Validating => "validating",
            Self::Mutating => "mutating",
            Self::Denormalizing => "denormalizing",
            Self::Publishing => "publishing",
            Self::Committed => "committed",
            Self::RolledBack => "rolled_back",
        }
    }
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned by catalogue commands and queries.
///
/// Store and publish failures carry their cause unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogueError {
    /// A payload field failed validation before any transaction opened.
    #[error("invalid field: {0}")]
    InvalidField(#[from] FieldError),
    /// A referenced id does not resolve to an existing row.
    #[error("{kind} {id} does not exist")]
    Validation { kind: EntityKind, id: i32 },
    /// The target of the use case does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: i32 },
    /// The relational store failed.
    #[error("store failure while {phase}: {source}")]
    Store {
        phase: SyncPhase,
        #[source]
        source: StoreError,
    },
    /// The sync channel did not accept a message.
    #[error("sync publish failed: {source}")]
    Publish {
        #[source]
        source: SyncChannelError,
    },
    /// The caller abandoned the use case before commit.
    #[error("operation cancelled before commit")]
    Cancelled,
}

impl CatalogueError {
    pub(crate) fn validation(kind: EntityKind, id: impl Into<i32>) -> Self {
        Self::Validation {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: impl Into<i32>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn store(phase: SyncPhase) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { phase, source }
    }
}

impl From<SyncChannelError> for CatalogueError {
    fn from(source: SyncChannelError) -> Self {
        Self::Publish { source }
    }
}
