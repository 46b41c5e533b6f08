//! Sync channel adapters.
//!
//! [`HttpSyncChannel`] posts each message to an HTTP ingestion endpoint (a
//! queue gateway in front of the indexer).

mod http_sync_channel;

pub use http_sync_channel::{DEDUP_KEY_HEADER, HttpSyncChannel, ORDERING_KEY_HEADER};
