//! Domain primitives, ports, and services for the catalogue.
//!
//! Purpose: keep the catalogue model and the write/denormalize/publish flow
//! independent of Diesel, actix-web, and the messaging transport. Adapters
//! live in `outbound` and `inbound` and reach the domain only through the
//! traits in [`ports`].
//!
//! Public surface:
//! - `User`, `Hashtag`, `Project` and their drafts: validated rows.
//! - `DenormalizedProject`, `SyncMessage`: the payload sent to the indexer.
//! - `CatalogueService`, `CatalogueQueryService`: the driving port
//!   implementations.
//! - `Error`, `ErrorCode`: the transport-agnostic error envelope.

pub mod association_resolver;
pub mod catalogue_error;
pub mod catalogue_query_service;
pub mod catalogue_service;
pub mod error;
mod fields;
pub mod hashtag;
pub mod ids;
pub mod ports;
pub mod project;
pub mod snapshot;
pub mod snapshot_builder;
pub mod sync_dispatcher;
pub mod user;

pub use self::association_resolver::{AssociationResolver, LinkedEntity};
pub use self::catalogue_error::{CatalogueError, EntityKind, SyncPhase};
pub use self::catalogue_query_service::CatalogueQueryService;
pub use self::catalogue_service::CatalogueService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fields::FieldError;
pub use self::hashtag::{Hashtag, HashtagDraft};
pub use self::ids::{HashtagId, ProjectId, UserId};
pub use self::project::{Project, ProjectDetails, ProjectDraft, ProjectLinks};
pub use self::snapshot::{DenormalizedProject, SYNC_ORDERING_KEY, SyncMessage, SyncMethod};
pub use self::snapshot_builder::SnapshotBuilder;
pub use self::sync_dispatcher::{DEFAULT_PUBLISH_TIMEOUT, SyncDispatcher};
pub use self::user::{User, UserDraft};
