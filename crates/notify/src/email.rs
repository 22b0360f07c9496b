//! SMTP email notifier via `lettre`.
//!
//! Port 465 connects with implicit TLS, any other port upgrades with STARTTLS.
//! The authenticated account is also the sender.

use callwatch_core::EmailConfig;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::traits::{Notification, Notifier, NotifyError};

#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

impl EmailNotifier {
    /// Build from the email section of the run configuration.
    ///
    /// Fails with [`NotifyError::Config`] when the user, password or receiver
    /// is missing, or when an address does not parse.
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let (Some(user), Some(password), Some(receiver)) = (
            config.user.as_deref(),
            config.password.as_deref(),
            config.receiver.as_deref(),
        ) else {
            return Err(NotifyError::Config(
                "EMAIL_USER, EMAIL_PASSWORD and EMAIL_RECEIVER must all be set".to_string(),
            ));
        };

        let from: Mailbox = user
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;
        let to: Mailbox = receiver
            .parse()
            .map_err(|e: lettre::address::AddressError| NotifyError::Config(e.to_string()))?;

        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| NotifyError::Config(e.to_string()))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(user.to_owned(), password.to_owned()))
            .build();

        Ok(Self {
            transport,
            from,
            to,
        })
    }

    pub fn recipient(&self) -> &Mailbox {
        &self.to
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipient = %self.to,
            "notification delivered"
        );
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}
