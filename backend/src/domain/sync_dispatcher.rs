//! Hands snapshots to the sync channel.
//!
//! Each dispatch encodes `{doc, method}` as JSON, stamps a fresh UUID v4
//! deduplication key, and uses the shared [`SYNC_ORDERING_KEY`] so the
//! indexer sees project updates in commit order. A publish that outlives the
//! configured timeout is reported as [`SyncChannelError::Timeout`]. There is
//! no retry.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use super::ports::{OutboundMessage, SyncChannel, SyncChannelError};
use super::{SYNC_ORDERING_KEY, SyncMessage};

/// Default bound on a single publish call.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct SyncDispatcher {
    channel: Arc<dyn SyncChannel>,
    publish_timeout: Duration,
}

impl SyncDispatcher {
    pub fn new(channel: Arc<dyn SyncChannel>, publish_timeout: Duration) -> Self {
        Self {
            channel,
            publish_timeout,
        }
    }

    /// Encode and publish one message.
    pub async fn dispatch(&self, message: &SyncMessage) -> Result<(), SyncChannelError> {
        let body = serde_json::to_vec(message)
            .map_err(|err| SyncChannelError::serialization(err.to_string()))?;
        let outbound = OutboundMessage {
            body,
            ordering_key: SYNC_ORDERING_KEY.to_owned(),
            dedup_key: Uuid::new_v4().to_string(),
        };

        debug!(
            project_id = %message.doc.id,
            method = message.method.as_str(),
            dedup_key = %outbound.dedup_key,
            "publishing sync message"
        );
        match tokio::time::timeout(self.publish_timeout, self.channel.publish(&outbound)).await {
            Ok(result) => result,
            Err(_) => Err(SyncChannelError::timeout(timeout_millis(self.publish_timeout))),
        }
    }
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
