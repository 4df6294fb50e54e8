//! External notification integrations

pub mod email;
pub mod whatsapp;

use async_trait::async_trait;
use thiserror::Error;

pub use email::SmtpNotifier;
pub use whatsapp::WhatsAppNotifier;

use crate::config::{NotificationChannel, NotificationConfig};
use crate::error::{AppError, AppResult};

/// A rendered message, ready for any channel
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Receipt for an accepted message
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub message_id: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("Failed to build message: {0}")]
    Build(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected provider response: {0}")]
    Rejected(String),

    #[error("Notifications are disabled")]
    Disabled,
}

/// Outbound message channel
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Short channel name for logs
    fn channel(&self) -> &'static str;

    async fn send(&self, to: &str, notification: &Notification) -> Result<Delivery, NotifyError>;
}

/// Used when no channel is configured
#[derive(Debug, Default, Clone)]
pub struct DisabledNotifier;

#[async_trait]
impl Notifier for DisabledNotifier {
    fn channel(&self) -> &'static str {
        "disabled"
    }

    async fn send(&self, to: &str, _notification: &Notification) -> Result<Delivery, NotifyError> {
        tracing::warn!(to = %to, "Notification dropped: no channel configured");
        Err(NotifyError::Disabled)
    }
}

/// Build the notifier selected by configuration
pub fn build_notifier(config: &NotificationConfig) -> AppResult<std::sync::Arc<dyn Notifier>> {
    match config.channel {
        NotificationChannel::Email => {
            let smtp = config.smtp.as_ref().ok_or_else(|| {
                AppError::Configuration("notifications.smtp is required for the email channel".into())
            })?;
            let notifier = SmtpNotifier::new(smtp)
                .map_err(|e| AppError::Configuration(format!("Invalid SMTP settings: {}", e)))?;
            Ok(std::sync::Arc::new(notifier))
        }
        NotificationChannel::Whatsapp => {
            let whatsapp = config.whatsapp.as_ref().ok_or_else(|| {
                AppError::Configuration(
                    "notifications.whatsapp is required for the whatsapp channel".into(),
                )
            })?;
            let notifier = WhatsAppNotifier::new(whatsapp)
                .map_err(|e| AppError::Configuration(format!("Invalid WhatsApp settings: {}", e)))?;
            Ok(std::sync::Arc::new(notifier))
        }
        NotificationChannel::Disabled => Ok(std::sync::Arc::new(DisabledNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_notifier_always_fails() {
        let notification = Notification {
            subject: "s".into(),
            html_body: "<p>b</p>".into(),
            text_body: "b".into(),
        };
        let result = DisabledNotifier.send("ops@example.com", &notification).await;
        assert!(matches!(result, Err(NotifyError::Disabled)));
    }

    #[test]
    fn test_missing_channel_settings() {
        let config = NotificationConfig {
            channel: NotificationChannel::Email,
            smtp: None,
            whatsapp: None,
        };
        assert!(matches!(
            build_notifier(&config),
            Err(AppError::Configuration(_))
        ));
    }
}
