//! Slack incoming-webhook notification channel.
//!
//! Posts the message JSON to the webhook url and reports the response status.
//! Rate limiting is the dispatcher's job (it paces deliveries), so a 429 is
//! reported like any other non-success status.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{DeliveryResult, NotificationMessage, Notifier};
use crate::utils::http_client;
use crate::{Error, Result};

/// Slack channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackConfig {
    /// Incoming webhook URL.
    pub webhook_url: String,
    /// Request timeout in seconds; 0 disables it.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    30
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

/// Slack notification channel.
pub struct SlackNotifier {
    config: SlackConfig,
    client: Client,
}

impl SlackNotifier {
    /// Create a new Slack channel.
    pub fn new(config: SlackConfig) -> Self {
        let client = http_client::build_client(Duration::from_secs(config.timeout_secs));
        Self { config, client }
    }

    /// Create a Slack channel sharing an existing HTTP client.
    pub fn with_client(config: SlackConfig, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn channel_type(&self) -> &'static str {
        "slack"
    }

    async fn deliver(&self, message: &NotificationMessage) -> Result<DeliveryResult> {
        let response = self
            .client
            .post(&self.config.webhook_url)
            .json(message)
            .send()
            .await
            .map_err(|e| Error::transport(format!("Slack request failed: {}", e)))?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        // Slack answers 200 with body "ok"; errors carry a short reason code.
        let status_message = if body.trim().is_empty() {
            status.canonical_reason().unwrap_or_default().to_string()
        } else {
            body.trim().to_string()
        };
        let result = DeliveryResult::new(status.as_u16(), status_message);

        if result.is_success() {
            debug!("Slack notification sent");
        } else {
            warn!(status = %result, "Slack webhook rejected notification");
        }
        Ok(result)
    }
}
