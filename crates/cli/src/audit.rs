//! Console plus file logging for batch runs.
//!
//! Two append-only files live in the log directory: `run_log.txt` with
//! everything at INFO and above, `error_log.txt` with errors only. Each file
//! line starts with `<logtime> | User: <user> |`.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const RUN_LOG: &str = "run_log.txt";
pub const ERROR_LOG: &str = "error_log.txt";

/// Stamps every file line with the run's logtime and the OS user in place
/// of the wall clock.
#[derive(Debug, Clone)]
pub struct AuditStamp {
    logtime: String,
    user: String,
}

impl AuditStamp {
    pub fn new(logtime: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            logtime: logtime.into(),
            user: user.into(),
        }
    }
}

impl FormatTime for AuditStamp {
    fn format_time(&self, w: &mut Writer<'_>) -> fmt::Result {
        write!(w, "{} | User: {} |", self.logtime, self.user)
    }
}

pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn open_append(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global subscriber. Console output honours `RUST_LOG`
/// (default `info`); the file layers have fixed levels.
pub fn init(log_dir: &Path, logtime: &str) -> anyhow::Result<()> {
    std::fs::create_dir_all(log_dir)?;
    let stamp = AuditStamp::new(logtime, current_user());

    let console = tracing_subscriber::fmt::layer().with_target(false).with_filter(
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    );

    let run_log = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(open_append(&log_dir.join(RUN_LOG))?))
        .with_ansi(false)
        .with_target(false)
        .with_timer(stamp.clone())
        .with_filter(LevelFilter::INFO);

    let error_log = tracing_subscriber::fmt::layer()
        .with_writer(Mutex::new(open_append(&log_dir.join(ERROR_LOG))?))
        .with_ansi(false)
        .with_target(false)
        .with_timer(stamp)
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(console)
        .with(run_log)
        .with(error_log)
        .try_init()?;
    Ok(())
}
