use std::path::PathBuf;

use callwatch_core::Config;
use clap::Parser;

/// Flag spam callers and suspicious calls in a call detail table.
///
/// Every run fits fresh models on the given table, writes the ranked
/// caller and call tables, and optionally emails a summary.
#[derive(Parser, Debug)]
#[command(name = "callwatch", about = "Spam call anomaly detection")]
pub struct CliArgs {
    /// Call table to analyze (.csv or .parquet)
    #[arg(long, env = "CALLWATCH_INPUT", default_value = "spam_calls_1000.csv")]
    pub input: PathBuf,

    /// Directory for result tables (overrides CALLWATCH_OUTPUT_DIR)
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Directory for run and error logs (overrides CALLWATCH_LOG_DIR)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Timestamp stamped on every audit log line, so batch wrappers can
    /// line their own logs up with ours. Defaults to the current UTC time.
    #[arg(long, env = "CALLWATCH_LOGTIME")]
    pub logtime: Option<String>,

    /// Expected anomaly fraction, in (0, 1)
    #[arg(long)]
    pub contamination: Option<f64>,

    /// Random seed for the isolation forests
    #[arg(long)]
    pub seed: Option<u64>,

    /// Trees per isolation forest
    #[arg(long)]
    pub trees: Option<usize>,

    /// Size of the suspicious-calls table
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Skip the email alert even when credentials are configured
    #[arg(long)]
    pub no_email: bool,
}

impl CliArgs {
    /// Layer command-line overrides on top of the environment config.
    pub fn apply(&self, config: &mut Config) {
        let d = &mut config.detection;
        if let Some(v) = self.contamination {
            d.contamination = v;
        }
        if let Some(v) = self.seed {
            d.seed = v;
        }
        if let Some(v) = self.trees {
            d.n_trees = v;
        }
        if let Some(v) = self.top_k {
            d.top_k = v;
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(dir) = &self.log_dir {
            config.output.log_dir = dir.clone();
        }
    }
}
