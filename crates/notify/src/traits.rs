//! Notifier trait definition and shared error types.

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// A rendered notification ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Human-readable name for this channel (e.g. "email").
    fn channel_name(&self) -> &str;
}

/// Result of dispatching a notification to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
