use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CallwatchError, Result};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

/// Parse a profiled env var, keeping `default` when unset.
/// A value that is set but unparseable is a `ConfigError`.
fn profiled_env_parse<T>(profile: &str, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match profiled_env_opt(profile, key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| CallwatchError::Config(format!("{key}={raw:?}: {e}"))),
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub detection: DetectionConfig,
    pub email: EmailConfig,
    pub output: OutputConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `CALLWATCH_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Result<Self> {
        let profile = env_opt("CALLWATCH_PROFILE")
            .unwrap_or_default()
            .to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Result<Self> {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Ok(Self {
            profile: p.to_string(),
            detection: DetectionConfig::from_env_profiled(p)?,
            email: EmailConfig::from_env_profiled(p)?,
            output: OutputConfig::from_env_profiled(p),
        })
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        let d = &self.detection;
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!(
            "  detection:   contamination={}, seed={}, trees={}, max_samples={}, max_depth={}, top_k={}",
            d.contamination,
            d.seed,
            d.n_trees,
            d.max_samples,
            d.max_depth.map_or_else(|| "auto".to_string(), |v| v.to_string()),
            d.top_k
        );
        tracing::info!(
            "  features:    night if hour < {} or > {}, intl_prefix={:?}",
            d.night_end_hour,
            d.night_start_hour,
            d.intl_prefix
        );
        tracing::info!(
            "  output:      dir={}, log_dir={}",
            self.output.output_dir.display(),
            self.output.log_dir.display()
        );
        tracing::info!(
            "  email:       host={}:{}, configured={}",
            self.email.smtp_host,
            self.email.smtp_port,
            self.email.is_configured()
        );
    }

    /// Return a redacted view safe for run summaries (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "detection": self.detection,
            "output": self.output,
            "email": {
                "smtp_host": self.email.smtp_host,
                "smtp_port": self.email.smtp_port,
                "configured": self.email.is_configured(),
            },
        })
    }
}

// ── Detection ─────────────────────────────────────────────────

/// Upper bound for an explicit `max_depth`. Tree building recurses once per
/// level on the worker stack.
pub const MAX_TREE_DEPTH: usize = 64;

/// Knobs of the scoring core. Every run fits on its own batch, so nothing here
/// refers to previously fitted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Expected fraction of anomalous rows per batch, in (0, 1).
    pub contamination: f64,
    pub seed: u64,
    /// Number of isolation trees.
    pub n_trees: usize,
    /// Upper bound on rows drawn per tree.
    pub max_samples: usize,
    /// Tree depth limit; `None` means `ceil(log2(subsample size))`.
    pub max_depth: Option<usize>,
    /// Bound on the exported suspicious-call subset.
    pub top_k: usize,
    /// Calls strictly after this hour are night calls.
    pub night_start_hour: u32,
    /// Calls strictly before this hour are night calls.
    pub night_end_hour: u32,
    pub intl_prefix: String,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            contamination: 0.05,
            seed: 42,
            n_trees: 100,
            max_samples: 256,
            max_depth: None,
            top_k: 50,
            night_start_hour: 22,
            night_end_hour: 6,
            intl_prefix: "+".to_string(),
        }
    }
}

impl DetectionConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        let d = Self::default();
        let max_depth = match profiled_env_opt(p, "CALLWATCH_MAX_DEPTH") {
            None => None,
            Some(raw) if raw.eq_ignore_ascii_case("auto") => None,
            Some(_) => Some(profiled_env_parse(p, "CALLWATCH_MAX_DEPTH", 0usize)?),
        };
        Ok(Self {
            contamination: profiled_env_parse(p, "CALLWATCH_CONTAMINATION", d.contamination)?,
            seed: profiled_env_parse(p, "CALLWATCH_SEED", d.seed)?,
            n_trees: profiled_env_parse(p, "CALLWATCH_TREES", d.n_trees)?,
            max_samples: profiled_env_parse(p, "CALLWATCH_MAX_SAMPLES", d.max_samples)?,
            max_depth,
            top_k: profiled_env_parse(p, "CALLWATCH_TOP_K", d.top_k)?,
            night_start_hour: profiled_env_parse(p, "CALLWATCH_NIGHT_START_HOUR", d.night_start_hour)?,
            night_end_hour: profiled_env_parse(p, "CALLWATCH_NIGHT_END_HOUR", d.night_end_hour)?,
            intl_prefix: profiled_env_or(p, "CALLWATCH_INTL_PREFIX", &d.intl_prefix),
        })
    }

    /// Reject settings the scorer cannot honor.
    pub fn validate(&self) -> Result<()> {
        if !(self.contamination > 0.0 && self.contamination < 1.0) {
            return Err(CallwatchError::Config(format!(
                "contamination must be in (0, 1), got {}",
                self.contamination
            )));
        }
        if self.n_trees == 0 {
            return Err(CallwatchError::Config("n_trees must be at least 1".into()));
        }
        if self.max_samples == 0 {
            return Err(CallwatchError::Config("max_samples must be at least 1".into()));
        }
        if let Some(depth) = self.max_depth {
            if depth == 0 || depth > MAX_TREE_DEPTH {
                return Err(CallwatchError::Config(format!(
                    "max_depth must be within 1-{MAX_TREE_DEPTH}, got {depth}"
                )));
            }
        }
        if self.night_start_hour > 23 || self.night_end_hour > 23 {
            return Err(CallwatchError::Config(format!(
                "night hours must be within 0-23, got start={} end={}",
                self.night_start_hour, self.night_end_hour
            )));
        }
        if self.intl_prefix.is_empty() {
            return Err(CallwatchError::Config("intl_prefix must not be empty".into()));
        }
        Ok(())
    }
}

// ── Email ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    /// Sender address, also the SMTP login.
    pub user: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,
    pub receiver: Option<String>,
}

impl EmailConfig {
    fn from_env_profiled(p: &str) -> Result<Self> {
        Ok(Self {
            smtp_host: profiled_env_or(p, "SMTP_HOST", "smtp.gmail.com"),
            smtp_port: profiled_env_parse(p, "SMTP_PORT", 465u16)?,
            user: profiled_env_opt(p, "EMAIL_USER"),
            password: profiled_env_opt(p, "EMAIL_PASSWORD"),
            receiver: profiled_env_opt(p, "EMAIL_RECEIVER"),
        })
    }

    /// Alerts are only sent when sender, password and receiver are all known.
    pub fn is_configured(&self) -> bool {
        self.user.is_some() && self.password.is_some() && self.receiver.is_some()
    }
}

// ── Output ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub output_dir: PathBuf,
    pub log_dir: PathBuf,
}

impl OutputConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            output_dir: PathBuf::from(profiled_env_or(p, "CALLWATCH_OUTPUT_DIR", "output")),
            log_dir: PathBuf::from(profiled_env_or(p, "CALLWATCH_LOG_DIR", "logs")),
        }
    }
}
