//! SMTP e-mail delivery

use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use uuid::Uuid;

use super::{Delivery, Notification, Notifier, NotifyError};
use crate::config::SmtpConfig;

/// Sends alerts as multipart (text + HTML) e-mail over STARTTLS
#[derive(Clone)]
pub struct SmtpNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|_| NotifyError::InvalidRecipient(config.from.clone()))?;

        let credentials = Credentials::new(config.username.clone(), config.password.clone());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self { mailer, from })
    }

    fn build_message(&self, to: &str, notification: &Notification) -> Result<Message, NotifyError> {
        let to: Mailbox = to
            .parse()
            .map_err(|_| NotifyError::InvalidRecipient(to.to_string()))?;
        let message_id = format!("<{}@inventory-forecast>", Uuid::new_v4());

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&notification.subject)
            .message_id(Some(message_id))
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(notification.text_body.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(notification.html_body.clone()),
                    ),
            )
            .map_err(|e| NotifyError::Build(e.to_string()))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    async fn send(&self, to: &str, notification: &Notification) -> Result<Delivery, NotifyError> {
        let message = self.build_message(to, notification)?;
        let message_id = message
            .headers()
            .get_raw("Message-ID")
            .map(str::to_string)
            .unwrap_or_default();

        tracing::debug!(to = %to, subject = %notification.subject, "Sending alert e-mail");
        self.mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        tracing::info!(to = %to, message_id = %message_id, "Alert e-mail sent");
        Ok(Delivery { message_id })
    }
}
