//! Extraction outcomes and the assembled failure report.
//!
//! Every failing step that is scanned produces exactly one outcome. Outcomes
//! are data, not errors: a log whose format nobody recognizes is an
//! [`ExtractionOutcome::Unrecognized`] carrying the raw log as fallback, and
//! a known-benign failure (the transient checkout hiccup) is a first-class
//! [`ExtractionOutcome::Benign`] variant rather than a magic string.
//!
//! The report tree ([`FailureReport`] → [`StageReport`] → [`StepReport`])
//! preserves CI execution order and is read-only after assembly.

use serde::{Deserialize, Serialize};

use crate::types::Status;

/// One failing behaviour-test scenario and the log paragraph describing it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioFailure {
    /// Short scenario id, e.g. `apps/files/sharing.feature:12`.
    pub scenario: String,
    /// The blank-line-delimited paragraph around the scenario's first
    /// occurrence in the log.
    pub excerpt: String,
}

/// The bounded, relevant slice of a raw log chosen for human review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogExcerpt {
    /// Per-scenario excerpts from a behaviour-test run, in log order.
    Scenarios(Vec<ScenarioFailure>),
    /// A plain text excerpt. May be empty when "nothing printed" is itself
    /// the finding.
    Text(String),
}

impl LogExcerpt {
    /// Single-line summary for the report bullet.
    pub fn summary(&self) -> String {
        match self {
            LogExcerpt::Scenarios(scenarios) => {
                format!("{} failed scenario(s)", scenarios.len())
            }
            LogExcerpt::Text(text) => {
                let first = text.lines().find(|line| !line.trim().is_empty());
                match first {
                    Some(line) => truncate_line(line.trim(), 120),
                    None => "no failure output captured".to_string(),
                }
            }
        }
    }

    /// Full multi-line excerpt for the collapsible report block.
    pub fn detail(&self) -> String {
        match self {
            LogExcerpt::Scenarios(scenarios) => scenarios
                .iter()
                .map(|failure| format!("{}\n{}", failure.scenario, failure.excerpt))
                .collect::<Vec<_>>()
                .join("\n\n"),
            LogExcerpt::Text(text) => text.clone(),
        }
    }
}

/// Result of running one extraction strategy over one step's raw log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionOutcome {
    /// A relevant excerpt was located.
    Excerpt(LogExcerpt),
    /// Known-benign failure, reported tersely and never escalated.
    Benign { reason: String },
    /// No strategy matched the step, or the strategy's markers were absent
    /// where absence is tolerated. Carries the raw log for diagnostics.
    Unrecognized { raw_log: String },
}

/// Per-step outcome as it appears in the report.
///
/// Extends [`ExtractionOutcome`] with the one scanner-level condition that
/// is recoverable but produces no log to extract from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepOutcome {
    Excerpt(LogExcerpt),
    Benign { reason: String },
    Unrecognized { raw_log: String },
    /// The log fetch for this step failed; the scan continued without it.
    LogUnavailable { error: String },
}

impl From<ExtractionOutcome> for StepOutcome {
    fn from(outcome: ExtractionOutcome) -> Self {
        match outcome {
            ExtractionOutcome::Excerpt(excerpt) => StepOutcome::Excerpt(excerpt),
            ExtractionOutcome::Benign { reason } => StepOutcome::Benign { reason },
            ExtractionOutcome::Unrecognized { raw_log } => StepOutcome::Unrecognized { raw_log },
        }
    }
}

impl StepOutcome {
    /// Single-line summary for the report bullet.
    pub fn summary(&self) -> String {
        match self {
            StepOutcome::Excerpt(excerpt) => excerpt.summary(),
            StepOutcome::Benign { reason } => reason.clone(),
            StepOutcome::Unrecognized { .. } => "log format not recognized".to_string(),
            StepOutcome::LogUnavailable { error } => {
                format!("could not fetch logs: {error}")
            }
        }
    }

    /// Full multi-line excerpt. Falls back to the raw log for unrecognized
    /// formats so nothing is silently dropped from the report.
    pub fn detail(&self) -> String {
        match self {
            StepOutcome::Excerpt(excerpt) => excerpt.detail(),
            StepOutcome::Benign { .. } => String::new(),
            StepOutcome::Unrecognized { raw_log } => raw_log.clone(),
            StepOutcome::LogUnavailable { .. } => String::new(),
        }
    }
}

/// One failing step and its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepReport {
    pub name: String,
    pub status: Status,
    pub outcome: StepOutcome,
}

/// What a scanned stage contributed to the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    /// The stage was cancelled after exceeding the wall-clock budget; its
    /// steps were not fetched.
    TimedOut { elapsed_secs: i64 },
    /// Per-step outcomes in execution order.
    Steps(Vec<StepReport>),
}

/// One stage section of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageReport {
    pub name: String,
    pub status: Status,
    pub outcome: StageOutcome,
}

/// Step status tally across the whole build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub success: usize,
    pub failure: usize,
    pub cancelled: usize,
    pub other: usize,
}

impl StatusCounts {
    /// Records one step status in the tally.
    pub fn record(&mut self, status: Status) {
        match status {
            Status::Success => self.success += 1,
            Status::Failure | Status::Error => self.failure += 1,
            Status::Cancelled | Status::Killed => self.cancelled += 1,
            _ => self.other += 1,
        }
    }
}

/// The finished failure report for one build: ordered, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureReport {
    pub build: u64,
    pub event: String,
    pub source: String,
    pub status: Status,
    pub step_counts: StatusCounts,
    /// Stage sections in pipeline order. Empty when the build state
    /// short-circuited the scan.
    pub stages: Vec<StageReport>,
}

impl FailureReport {
    /// Whether the scan produced anything worth rendering.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

fn truncate_line(line: &str, max_chars: usize) -> String {
    if line.chars().count() <= max_chars {
        return line.to_string();
    }
    let cut: String = line.chars().take(max_chars).collect();
    format!("{cut}…")
}
