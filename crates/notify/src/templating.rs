//! Minijinja rendering of the end-of-run alert.

use std::path::Path;

use callwatch_compute::DualAnomalyReport;
use serde::Serialize;

use crate::traits::{Notification, NotifyError};

pub const DEFAULT_SUBJECT: &str = "Spam Call Anomaly Alert";

pub const DEFAULT_BODY: &str = "\
Hello,

The spam call anomaly detection run has completed. Caller-level and call-level \
anomaly reports, including the top {{ top_k }} suspicious calls, have been saved to {{ output_dir }}.

Flagged callers: {{ flagged_callers }} of {{ total_callers }}
Flagged calls: {{ flagged_calls }} of {{ total_calls }}
{% if top_calls %}
Most suspicious calls:
{% for c in top_calls %}- {{ c.caller_id }} -> {{ c.receiver_id }} at {{ c.call_start_time }} (score {{ c.anomaly_score | round(4) }})
{% endfor %}{% endif %}
Run {{ run_id }} logged at {{ logtime }}.
";

/// Values available to alert templates.
#[derive(Debug, Clone, Serialize)]
pub struct AlertContext {
    pub run_id: String,
    pub logtime: String,
    pub output_dir: String,
    pub top_k: usize,
    pub total_callers: usize,
    pub flagged_callers: usize,
    pub total_calls: usize,
    pub flagged_calls: usize,
    /// The first few rows of the top-K table.
    pub top_calls: Vec<AlertCall>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AlertCall {
    pub caller_id: String,
    pub receiver_id: String,
    pub call_start_time: String,
    pub anomaly_score: f64,
}

impl AlertContext {
    /// Summarize a finished run, listing at most `preview` of its top calls.
    pub fn from_report(
        report: &DualAnomalyReport,
        output_dir: &Path,
        logtime: &str,
        top_k: usize,
        preview: usize,
    ) -> Self {
        Self {
            run_id: report.run_id.to_string(),
            logtime: logtime.to_string(),
            output_dir: output_dir.display().to_string(),
            top_k,
            total_callers: report.callers.len(),
            flagged_callers: report.metrics.flagged_callers,
            total_calls: report.calls.len(),
            flagged_calls: report.metrics.flagged_calls,
            top_calls: report
                .top_calls
                .iter()
                .take(preview)
                .map(|c| AlertCall {
                    caller_id: c.caller_id.clone(),
                    receiver_id: c.receiver_id.clone(),
                    call_start_time: c.call_start_time.clone(),
                    anomaly_score: c.anomaly_score,
                })
                .collect(),
        }
    }
}

/// Renders alert templates.
///
/// Templates are plain strings, so a fresh [`minijinja::Environment`] is
/// built per render.
#[derive(Debug, Clone)]
pub struct TemplateRenderer {
    subject: String,
    body: String,
}

impl TemplateRenderer {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }

    fn build_env() -> minijinja::Environment<'static> {
        let mut env = minijinja::Environment::new();
        env.add_filter("round", round_filter);
        env
    }

    /// Render one template string against `ctx`.
    pub fn render(&self, template_str: &str, ctx: &AlertContext) -> Result<String, NotifyError> {
        Self::build_env()
            .render_str(template_str, ctx)
            .map_err(|e| NotifyError::Template(e.to_string()))
    }

    /// Render both subject and body into a deliverable notification.
    pub fn render_alert(&self, ctx: &AlertContext) -> Result<Notification, NotifyError> {
        Ok(Notification {
            subject: self.render(&self.subject, ctx)?,
            body: self.render(&self.body, ctx)?,
        })
    }
}

impl Default for TemplateRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_SUBJECT, DEFAULT_BODY)
    }
}

/// Round a float to N decimal places.
fn round_filter(value: f64, decimals: Option<u32>) -> String {
    let n = decimals.unwrap_or(0);
    format!("{:.prec$}", value, prec = n as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> AlertContext {
        AlertContext {
            run_id: "run-1".to_string(),
            logtime: "2024-03-01T00:00:00Z".to_string(),
            output_dir: "output".to_string(),
            top_k: 50,
            total_callers: 40,
            flagged_callers: 2,
            total_calls: 1000,
            flagged_calls: 50,
            top_calls: vec![AlertCall {
                caller_id: "9999".to_string(),
                receiver_id: "+447700900001".to_string(),
                call_start_time: "2024-03-01 03:00:00".to_string(),
                anomaly_score: 0.123456,
            }],
        }
    }

    #[test]
    fn default_alert_renders() {
        let n = TemplateRenderer::default()
            .render_alert(&sample_context())
            .unwrap();
        assert_eq!(n.subject, "Spam Call Anomaly Alert");
        assert!(n.body.contains("top 50 suspicious calls"));
        assert!(n.body.contains("Flagged callers: 2 of 40"));
        assert!(n.body.contains("Flagged calls: 50 of 1000"));
        assert!(n.body.contains("- 9999 -> +447700900001 at 2024-03-01 03:00:00 (score 0.1235)"));
    }

    #[test]
    fn no_top_calls_section_when_empty() {
        let mut ctx = sample_context();
        ctx.top_calls.clear();
        let n = TemplateRenderer::default().render_alert(&ctx).unwrap();
        assert!(!n.body.contains("Most suspicious calls"));
    }

    #[test]
    fn custom_subject() {
        let renderer = TemplateRenderer::new("[{{ flagged_callers }}] callers flagged", "x");
        let n = renderer.render_alert(&sample_context()).unwrap();
        assert_eq!(n.subject, "[2] callers flagged");
    }

    #[test]
    fn invalid_template_produces_error() {
        let renderer = TemplateRenderer::default();
        match renderer.render("{{ unclosed", &sample_context()) {
            Err(NotifyError::Template(msg)) => assert!(!msg.is_empty()),
            other => panic!("expected template error, got {other:?}"),
        }
    }
}
