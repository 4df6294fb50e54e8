//! WhatsApp delivery through a CallMeBot-style HTTP gateway
//!
//! The gateway answers 200 with a free-text body; only the known success
//! phrases count as delivered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use uuid::Uuid;

use super::{Delivery, Notification, Notifier, NotifyError};
use crate::config::WhatsAppConfig;

const SUCCESS_MARKERS: [&str; 2] = ["Message queued", "Message sent successfully"];

/// WhatsApp gateway client
#[derive(Clone)]
pub struct WhatsAppNotifier {
    client: Client,
    api_url: String,
    phone: String,
    api_key: String,
}

impl WhatsAppNotifier {
    pub fn new(config: &WhatsAppConfig) -> Result<Self, NotifyError> {
        if config.phone.trim().is_empty() || config.api_key.trim().is_empty() {
            return Err(NotifyError::InvalidRecipient(
                "phone and api_key must both be set".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            phone: config.phone.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

/// Whether a gateway response body reports a delivered message
pub fn is_accepted(body: &str) -> bool {
    SUCCESS_MARKERS.iter().any(|marker| body.contains(marker))
}

#[async_trait]
impl Notifier for WhatsAppNotifier {
    fn channel(&self) -> &'static str {
        "whatsapp"
    }

    /// The gateway is bound to one phone; `to` is only logged
    async fn send(&self, to: &str, notification: &Notification) -> Result<Delivery, NotifyError> {
        let text = format!("{}\n\n{}", notification.subject, notification.text_body);

        let response = self
            .client
            .get(&self.api_url)
            .query(&[
                ("phone", self.phone.as_str()),
                ("text", text.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !is_accepted(&body) {
            tracing::warn!(requested_for = %to, response = %body, "WhatsApp gateway rejected message");
            return Err(NotifyError::Rejected(body));
        }

        let message_id = Uuid::new_v4().to_string();
        tracing::info!(phone = %self.phone, requested_for = %to, message_id = %message_id, "WhatsApp alert sent");
        Ok(Delivery { message_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_accepted() {
        assert!(is_accepted("Message queued. You will receive it in a few seconds."));
        assert!(is_accepted("<p>Message sent successfully</p>"));
        assert!(!is_accepted("APIKey is invalid"));
        assert!(!is_accepted(""));
    }

    #[test]
    fn test_requires_phone_and_key() {
        let config = WhatsAppConfig {
            api_url: "https://api.callmebot.com/whatsapp.php".into(),
            phone: "".into(),
            api_key: "123".into(),
            timeout_secs: 10,
        };
        assert!(matches!(
            WhatsAppNotifier::new(&config),
            Err(NotifyError::InvalidRecipient(_))
        ));
    }
}
