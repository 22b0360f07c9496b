//! Fans one notification out to every configured channel.
//!
//! A failing channel is logged and reported, never fatal to the others.

use crate::traits::{DispatchResult, Notification, Notifier};

#[derive(Default)]
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>) -> Self {
        Self { channels }
    }

    pub fn add_channel(&mut self, channel: Box<dyn Notifier>) {
        self.channels.push(channel);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub async fn dispatch(&self, notification: &Notification) -> Vec<DispatchResult> {
        if self.channels.is_empty() {
            tracing::debug!("No notification channels configured");
            return Vec::new();
        }

        let mut results = Vec::with_capacity(self.channels.len());

        for channel in &self.channels {
            let start = std::time::Instant::now();
            let result = channel.send(notification).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, error) = match result {
                Ok(()) => (true, None),
                Err(e) => {
                    tracing::error!(
                        channel = channel.channel_name(),
                        error = %e,
                        duration_ms,
                        "Notification delivery failed"
                    );
                    (false, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                channel: channel.channel_name().to_string(),
                success,
                error,
                duration_ms,
            });
        }

        results
    }
}
