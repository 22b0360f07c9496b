//! End-of-run alerting.
//!
//! - `Notifier` trait for delivery channels, with an SMTP implementation
//! - Minijinja rendering of the alert subject and body
//! - Dispatcher that fans an alert out to every channel

pub mod dispatcher;
pub mod email;
pub mod templating;
pub mod traits;

pub use dispatcher::Dispatcher;
pub use email::EmailNotifier;
pub use templating::{AlertContext, TemplateRenderer};
pub use traits::{Notification, Notifier, NotifyError};
