mod audit;
mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::{debug, error, info, warn};

use callwatch_compute::{DualAnomalyReport, DualPipeline};
use callwatch_core::Config;
use callwatch_ingest::{import_table, ReportWriter};
use callwatch_notify::{AlertContext, Dispatcher, EmailNotifier, Notifier, TemplateRenderer};

use crate::cli::CliArgs;

/// Top calls quoted in the alert body.
const ALERT_PREVIEW: usize = 10;

#[tokio::main]
async fn main() -> Result<()> {
    callwatch_core::config::load_dotenv();
    let args = CliArgs::parse();

    let mut config = Config::from_env().context("failed to load configuration")?;
    args.apply(&mut config);

    let logtime = args
        .logtime
        .clone()
        .unwrap_or_else(|| Utc::now().to_rfc3339());
    audit::init(&config.output.log_dir, &logtime).context("failed to initialize logging")?;

    match run(&args, &config, &logtime).await {
        Ok(()) => {
            info!("Run completed");
            Ok(())
        }
        Err(e) => {
            error!("Run failed: {e:#}");
            Err(e)
        }
    }
}

async fn run(args: &CliArgs, config: &Config, logtime: &str) -> Result<()> {
    info!("Starting spam call anomaly detection");
    config.log_summary();
    debug!(config = %config.redacted_summary(), "effective configuration");

    let pipeline = DualPipeline::new(config.detection.clone()).context("invalid detection config")?;

    let records = import_table(&args.input)
        .with_context(|| format!("failed to load {}", args.input.display()))?;
    info!(records = records.len(), input = %args.input.display(), "Data loaded");

    let report = pipeline.run(&records).context("anomaly detection failed")?;
    info!(
        flagged_callers = report.metrics.flagged_callers,
        flagged_calls = report.metrics.flagged_calls,
        "Caller-level and call-level anomaly detection completed"
    );

    let writer = ReportWriter::new(&config.output.output_dir, config.detection.top_k);
    let paths = writer.write(&report, logtime).context("failed to write reports")?;
    info!(
        callers = %paths.caller_table.display(),
        calls = %paths.call_table.display(),
        top = %paths.top_calls.display(),
        dir = %writer.output_dir().display(),
        "Reports and plots saved"
    );

    if args.no_email {
        info!("Email alert disabled by --no-email");
    } else {
        send_alert(config, &report, writer.output_dir(), logtime).await;
    }
    Ok(())
}

/// Email the run summary. Delivery problems are logged, never fatal.
async fn send_alert(config: &Config, report: &DualAnomalyReport, output_dir: &Path, logtime: &str) {
    if !config.email.is_configured() {
        warn!("Email credentials not set, skipping alert");
        return;
    }

    let notifier: Box<dyn Notifier> = match EmailNotifier::from_config(&config.email) {
        Ok(n) => Box::new(n),
        Err(e) => {
            error!("Failed to set up email alert: {e}");
            return;
        }
    };

    let ctx = AlertContext::from_report(
        report,
        output_dir,
        logtime,
        config.detection.top_k,
        ALERT_PREVIEW,
    );
    let notification = match TemplateRenderer::default().render_alert(&ctx) {
        Ok(n) => n,
        Err(e) => {
            error!("Failed to render email alert: {e}");
            return;
        }
    };

    let dispatcher = Dispatcher::new(vec![notifier]);
    for result in dispatcher.dispatch(&notification).await {
        if result.success {
            info!(channel = %result.channel, duration_ms = result.duration_ms, "Email alert sent");
        }
    }
}
