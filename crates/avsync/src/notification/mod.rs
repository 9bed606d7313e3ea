//! Notification sinks.
//!
//! A sink delivers one mismatch alert (subject + body) to its configured
//! destination and returns the identifier the transport assigned to it:
//! - AWS SNS topics (feature `sns`)
//! - Generic webhooks (HTTP POST/PUT)
//! - The log, for dry runs

#[cfg(feature = "sns")]
mod sns;
mod webhook;

#[cfg(feature = "sns")]
pub use sns::{SnsConfig, SnsSink};
pub use webhook::{WebhookAuth, WebhookConfig, WebhookSink};

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use crate::error::NotifyError;

/// Identifier returned by the transport for a published message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generated() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trait for notification sinks.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Get the sink type name.
    fn sink_type(&self) -> &'static str;

    /// Publish one message. Delivery is attempted once.
    async fn publish(&self, subject: &str, body: &str) -> Result<MessageId, NotifyError>;
}

/// Sink that only writes the alert to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    fn sink_type(&self) -> &'static str {
        "log"
    }

    async fn publish(&self, subject: &str, body: &str) -> Result<MessageId, NotifyError> {
        let id = MessageId::generated();
        info!(message_id = %id, subject, "Dry run, alert not delivered:\n{body}");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_sink_returns_fresh_ids() {
        let a = LogSink.publish("s", "b").await.unwrap();
        let b = LogSink.publish("s", "b").await.unwrap();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }
}
