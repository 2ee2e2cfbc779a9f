//! Telemetry for steps whose log format nobody recognizes.
//!
//! Notification is a side-channel observation, not part of the extraction
//! result: the scanner records the placeholder outcome either way and only
//! logs a warning when the sink is unreachable.

use std::time::Duration;

use serde::Serialize;

use drone_triage_core::{Stage, Step};

/// Diagnostic payload for one unrecognized step.
#[derive(Debug, Clone, Serialize)]
pub struct UnrecognizedFormat<'a> {
    pub step_name: &'a str,
    pub stage: &'a Stage,
    pub step: &'a Step,
    pub diagnostic_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    #[error("telemetry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telemetry sink answered HTTP {0}")]
    Status(u16),
}

/// Sink for unrecognized-format diagnostics. Best-effort by contract:
/// callers must not let a failed notification affect the report.
pub trait TelemetryNotifier: Sync {
    fn notify_unrecognized(&self, event: &UnrecognizedFormat<'_>) -> Result<(), TelemetryError>;
}

/// Discards all notifications.
pub struct NoTelemetry;

impl TelemetryNotifier for NoTelemetry {
    fn notify_unrecognized(&self, _event: &UnrecognizedFormat<'_>) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Posts the diagnostic payload as JSON to a webhook.
pub struct WebhookNotifier {
    http: reqwest::blocking::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, TelemetryError> {
        let http = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
        })
    }
}

impl TelemetryNotifier for WebhookNotifier {
    fn notify_unrecognized(&self, event: &UnrecognizedFormat<'_>) -> Result<(), TelemetryError> {
        let response = self.http.post(&self.url).json(event).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(TelemetryError::Status(status.as_u16()));
        }
        Ok(())
    }
}
