pub mod config;
pub mod error;
pub mod record;

pub use config::{Config, DetectionConfig, EmailConfig, OutputConfig, MAX_TREE_DEPTH};
pub use error::{CallwatchError, Result};
pub use record::*;
