//! AWS SNS notification sink.

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_sns::Client as SnsClient;
use aws_sdk_sns::error::DisplayErrorContext;
use tracing::{debug, info};

use super::{MessageId, NotificationSink};
use crate::error::NotifyError;

/// SNS sink configuration.
#[derive(Debug, Clone)]
pub struct SnsConfig {
    /// Destination topic.
    pub topic_arn: String,
    /// Region override; the default provider chain is used when `None`.
    pub region: Option<String>,
}

/// Publishes alerts to an SNS topic.
pub struct SnsSink {
    client: SnsClient,
    topic_arn: String,
}

impl SnsSink {
    /// Create a sink using AWS credentials from the environment, profile or instance role.
    pub async fn new(config: SnsConfig) -> Result<Self, NotifyError> {
        if !config.topic_arn.starts_with("arn:") {
            return Err(NotifyError::Configuration(format!(
                "`{}` is not a topic ARN",
                config.topic_arn
            )));
        }

        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.filter(|r| !r.trim().is_empty()) {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        info!(
            topic_arn = %config.topic_arn,
            region = ?sdk_config.region(),
            "Initialized SNS notification sink"
        );

        Ok(Self {
            client: SnsClient::new(&sdk_config),
            topic_arn: config.topic_arn,
        })
    }
}

#[async_trait]
impl NotificationSink for SnsSink {
    fn sink_type(&self) -> &'static str {
        "sns"
    }

    async fn publish(&self, subject: &str, body: &str) -> Result<MessageId, NotifyError> {
        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(body)
            .send()
            .await
            .map_err(|e| NotifyError::Sns(DisplayErrorContext(&e).to_string()))?;

        let id = output
            .message_id()
            .map(|id| MessageId(id.to_string()))
            .ok_or_else(|| NotifyError::Sns("publish response has no MessageId".to_string()))?;

        debug!(topic_arn = %self.topic_arn, message_id = %id, "SNS message published");
        Ok(id)
    }
}
