//! Notification delivery.
//!
//! A [`Notifier`] delivers one [`NotificationMessage`] per call and reports the
//! endpoint's answer. It never retries: a failed delivery is surfaced to the
//! dispatcher, which decides what happens next.
//!
//! # Example
//!
//! ```ignore
//! use job_herald::notification::{MessageTemplate, SlackNotifier, SlackConfig};
//!
//! let notifier = SlackNotifier::new(SlackConfig {
//!     webhook_url: "https://hooks.slack.com/services/...".to_string(),
//!     ..Default::default()
//! });
//! let template = MessageTemplate::new(FeedVariant::JobListing, "Londrina");
//! let result = notifier.deliver(&template.compose(&job, 0, 1)).await?;
//! ```

mod message;
mod slack;

pub use message::{Attachment, AttachmentField, MessageTemplate, NotificationMessage};
pub use slack::{SlackConfig, SlackNotifier};

use async_trait::async_trait;

use crate::Result;

/// Status code the notification endpoint answers with on success.
pub const SUCCESS_STATUS: u16 = 200;

/// Answer from the notification endpoint for one delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResult {
    pub status_code: u16,
    pub status_message: String,
}

impl DeliveryResult {
    pub fn new(status_code: u16, status_message: impl Into<String>) -> Self {
        Self {
            status_code,
            status_message: status_message.into(),
        }
    }

    pub fn ok() -> Self {
        Self::new(SUCCESS_STATUS, "OK")
    }

    pub fn is_success(&self) -> bool {
        self.status_code == SUCCESS_STATUS
    }
}

impl std::fmt::Display for DeliveryResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status_code, self.status_message)
    }
}

/// Outbound notification capability.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Get the channel type name.
    fn channel_type(&self) -> &'static str;

    /// Deliver one message.
    ///
    /// Returns `Err` with [`crate::Error::Transport`] when the request could
    /// not be made at all; otherwise the endpoint's status, successful or not.
    async fn deliver(&self, message: &NotificationMessage) -> Result<DeliveryResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delivery_result_success() {
        assert!(DeliveryResult::ok().is_success());
        assert!(!DeliveryResult::new(204, "No Content").is_success());
        assert!(!DeliveryResult::new(500, "Internal Server Error").is_success());
    }

    #[test]
    fn test_delivery_result_display() {
        let result = DeliveryResult::new(404, "no_service");
        assert_eq!(result.to_string(), "404: no_service");
    }
}
