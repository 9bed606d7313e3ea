//! Generic webhook notification sink.

use async_trait::async_trait;
use reqwest::{Client, header::HeaderMap};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use super::{MessageId, NotificationSink};
use crate::error::NotifyError;

/// Webhook sink configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL.
    pub url: String,
    /// HTTP method (default: POST).
    #[serde(default = "default_method")]
    pub method: String,
    /// Custom headers.
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    /// Authentication type.
    pub auth: Option<WebhookAuth>,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_method() -> String {
    "POST".to_string()
}

fn default_timeout() -> u64 {
    30
}

/// Webhook authentication configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WebhookAuth {
    /// Bearer token authentication.
    Bearer { token: String },
    /// Basic authentication.
    Basic { username: String, password: String },
    /// Custom header authentication.
    Header { name: String, value: String },
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: default_method(),
            headers: Vec::new(),
            auth: None,
            timeout_secs: default_timeout(),
        }
    }
}

/// Response fields some receivers use to echo a delivery id.
#[derive(Debug, Default, Deserialize)]
struct WebhookReceipt {
    message_id: Option<String>,
    id: Option<String>,
}

/// Generic webhook notification sink.
pub struct WebhookSink {
    config: WebhookConfig,
    client: Client,
}

impl WebhookSink {
    pub fn new(config: WebhookConfig) -> Result<Self, NotifyError> {
        if config.url.trim().is_empty() {
            return Err(NotifyError::Configuration(
                "webhook URL is empty".to_string(),
            ));
        }
        crate::fetcher::install_rustls_provider();
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Build the request headers.
    fn build_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        for (name, value) in &self.config.headers {
            if let (Ok(name), Ok(value)) = (
                name.parse::<reqwest::header::HeaderName>(),
                value.parse::<reqwest::header::HeaderValue>(),
            ) {
                headers.insert(name, value);
            } else {
                warn!(header = %name, "Skipping invalid webhook header");
            }
        }

        if let Some(auth) = &self.config.auth {
            match auth {
                WebhookAuth::Bearer { token } => {
                    if let Ok(value) = format!("Bearer {token}").parse() {
                        headers.insert(reqwest::header::AUTHORIZATION, value);
                    }
                }
                WebhookAuth::Header { name, value } => {
                    if let (Ok(name), Ok(value)) = (
                        name.parse::<reqwest::header::HeaderName>(),
                        value.parse::<reqwest::header::HeaderValue>(),
                    ) {
                        headers.insert(name, value);
                    }
                }
                WebhookAuth::Basic { .. } => {
                    // Applied on the request builder.
                }
            }
        }

        headers
    }

    /// Build the JSON payload.
    fn build_payload(&self, subject: &str, body: &str) -> serde_json::Value {
        json!({
            "subject": subject,
            "message": body,
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    fn sink_type(&self) -> &'static str {
        "webhook"
    }

    async fn publish(&self, subject: &str, body: &str) -> Result<MessageId, NotifyError> {
        let payload = self.build_payload(subject, body);
        let headers = self.build_headers();

        let mut request = match self.config.method.to_uppercase().as_str() {
            "PUT" => self.client.put(&self.config.url),
            _ => self.client.post(&self.config.url),
        };

        request = request.headers(headers).json(&payload);

        if let Some(WebhookAuth::Basic { username, password }) = &self.config.auth {
            request = request.basic_auth(username, Some(password));
        }

        let response = request.send().await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            warn!("Webhook failed: {} - {}", status, text);
            return Err(NotifyError::Status { status, body: text });
        }

        let receipt: WebhookReceipt = serde_json::from_str(&text).unwrap_or_default();
        let id = receipt
            .message_id
            .or(receipt.id)
            .map(MessageId)
            .unwrap_or_else(MessageId::generated);

        debug!(message_id = %id, "Webhook notification sent");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_webhook_config_defaults() {
        let config = WebhookConfig::new("https://example.com/hook");
        assert_eq!(config.method, "POST");
        assert_eq!(config.timeout_secs, 30);
        assert!(config.auth.is_none());
    }

    #[test]
    fn test_empty_url_is_rejected() {
        assert!(matches!(
            WebhookSink::new(WebhookConfig::new("  ")),
            Err(NotifyError::Configuration(_))
        ));
    }

    #[test]
    fn test_build_payload() {
        let sink = WebhookSink::new(WebhookConfig::new("https://example.com/hook")).unwrap();
        let payload = sink.build_payload("Discontinuity mismatch detected", "body");
        assert_eq!(payload["subject"], "Discontinuity mismatch detected");
        assert_eq!(payload["message"], "body");
        assert!(payload["timestamp"].is_string());
    }

    #[test]
    fn test_build_headers_with_bearer() {
        let config = WebhookConfig {
            auth: Some(WebhookAuth::Bearer {
                token: "test-token".to_string(),
            }),
            headers: vec![("x-channel".to_string(), "news-1".to_string())],
            ..WebhookConfig::new("https://example.com/hook")
        };
        let sink = WebhookSink::new(config).unwrap();
        let headers = sink.build_headers();

        assert_eq!(
            headers.get(reqwest::header::AUTHORIZATION).unwrap(),
            "Bearer test-token"
        );
        assert_eq!(headers.get("x-channel").unwrap(), "news-1");
    }

    #[test]
    fn test_config_deserializes_with_defaults() {
        let config: WebhookConfig =
            serde_json::from_str(r#"{"url":"https://e.com/h","auth":{"type":"Bearer","token":"t"}}"#)
                .unwrap();
        assert_eq!(config.method, "POST");
        assert!(matches!(config.auth, Some(WebhookAuth::Bearer { .. })));
    }
}
