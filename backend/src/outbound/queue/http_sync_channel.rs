//! Reqwest-backed sync channel adapter.
//!
//! This adapter owns transport details only: it posts the already encoded
//! JSON body, carries the ordering and deduplication keys as headers, and
//! maps transport and status failures onto [`SyncChannelError`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};

use crate::domain::ports::{OutboundMessage, SyncChannel, SyncChannelError};

/// Header carrying the ordering key; messages sharing it are delivered in
/// order.
pub const ORDERING_KEY_HEADER: &str = "X-Message-Group-Id";
/// Header carrying the per-message deduplication key.
pub const DEDUP_KEY_HEADER: &str = "X-Message-Deduplication-Id";

/// Sync channel that performs one HTTP POST per message.
pub struct HttpSyncChannel {
    client: Client,
    endpoint: Url,
    timeout: Duration,
}

impl HttpSyncChannel {
    /// Build an adapter using a reqwest client with an explicit request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(endpoint: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint,
            timeout,
        })
    }

    fn map_transport_error(&self, error: reqwest::Error) -> SyncChannelError {
        if error.is_timeout() {
            SyncChannelError::timeout(u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX))
        } else {
            SyncChannelError::unavailable(error.to_string())
        }
    }
}

#[async_trait]
impl SyncChannel for HttpSyncChannel {
    async fn publish(&self, message: &OutboundMessage) -> Result<(), SyncChannelError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(ORDERING_KEY_HEADER, message.ordering_key.as_str())
            .header(DEDUP_KEY_HEADER, message.dedup_key.as_str())
            .body(message.body.clone())
            .send()
            .await
            .map_err(|err| self.map_transport_error(err))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response
            .bytes()
            .await
            .map_err(|err| self.map_transport_error(err))?;
        Err(map_status_error(status, body.as_ref()))
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> SyncChannelError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    };

    match status {
        StatusCode::TOO_MANY_REQUESTS => SyncChannelError::unavailable(message),
        _ if status.is_client_error() => SyncChannelError::rejected(message),
        _ => SyncChannelError::unavailable(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .take(PREVIEW_CHAR_LIMIT)
        .collect()
}
