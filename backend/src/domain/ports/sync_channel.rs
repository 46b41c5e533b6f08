//! Driven port for the messaging channel feeding the search indexer.
use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by sync channel adapters.
    pub enum SyncChannelError {
        /// Channel infrastructure could not be reached.
        Unavailable { message: String } => "sync channel is unavailable: {message}",
        /// The channel refused the message.
        Rejected { message: String } => "sync message was rejected: {message}",
        /// The publish call did not complete within its deadline.
        Timeout { timeout_ms: u64 } => "sync publish timed out after {timeout_ms}ms",
        /// The message body could not be encoded.
        Serialization { message: String } => "sync message could not be encoded: {message}",
    }
}

/// Transport-level envelope handed to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    /// Encoded JSON body.
    pub body: Vec<u8>,
    /// Messages sharing this key are delivered in publish order.
    pub ordering_key: String,
    /// Per-message key the channel uses to drop duplicates.
    pub dedup_key: String,
}

/// Publish capability of the external channel.
///
/// Implementations make a single attempt and never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SyncChannel: Send + Sync {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), SyncChannelError>;
}
