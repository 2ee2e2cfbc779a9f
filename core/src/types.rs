//! Build/stage/step tree as delivered by the CI server.
//!
//! These types mirror the JSON shapes of the Drone REST API. A [`Build`] is
//! an immutable snapshot fetched once per report: stages in pipeline order,
//! each owning its steps in execution order. Logs are addressed by the
//! `(build, stage number, step number)` triple and arrive as a sequence of
//! [`LogLine`]s whose `out` fields concatenate into the raw log blob.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Execution state reported by the CI server for builds, stages, and steps.
///
/// The server uses the same status vocabulary at every level of the tree.
/// Strings outside the known set deserialize to [`Status::Unknown`] rather
/// than failing the whole build fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum Status {
    Success,
    Failure,
    Error,
    Running,
    Pending,
    Cancelled,
    Killed,
    Skipped,
    #[default]
    Unknown,
}

impl From<String> for Status {
    fn from(value: String) -> Self {
        match value.as_str() {
            "success" => Status::Success,
            "failure" => Status::Failure,
            "error" => Status::Error,
            "running" => Status::Running,
            "pending" => Status::Pending,
            "cancelled" => Status::Cancelled,
            "killed" => Status::Killed,
            "skipped" => Status::Skipped,
            _ => Status::Unknown,
        }
    }
}

impl Status {
    /// Whether a build in this state warrants a scan at all.
    ///
    /// Successful, still-running, pending, and skipped builds short-circuit
    /// before any stage- or step-level work.
    pub fn build_needs_scan(self) -> bool {
        !matches!(
            self,
            Status::Success | Status::Running | Status::Pending | Status::Skipped
        )
    }

    /// Whether a stage in this state should be walked for failing steps.
    pub fn stage_needs_scan(self) -> bool {
        !matches!(self, Status::Success | Status::Pending | Status::Running)
    }

    /// Whether a step in this state should be classified and excerpted.
    ///
    /// Cancelled and killed steps were stopped mid-stream; their logs are
    /// truncated noise and never reach the extractor.
    pub fn step_needs_scan(self) -> bool {
        !matches!(
            self,
            Status::Success | Status::Skipped | Status::Cancelled | Status::Killed
        )
    }

    /// Wire form of the status (the lowercase string the server sends).
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::Failure => "failure",
            Status::Error => "error",
            Status::Running => "running",
            Status::Pending => "pending",
            Status::Cancelled => "cancelled",
            Status::Killed => "killed",
            Status::Skipped => "skipped",
            Status::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build summary as returned by the build-listing endpoint (no stage tree).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildSummary {
    pub number: u64,
    /// Trigger event, e.g. `push` or `pull_request`.
    #[serde(default)]
    pub event: String,
    /// Source ref or branch the build ran against.
    #[serde(default)]
    pub source: String,
    pub status: Status,
}

/// Full build snapshot with the stage/step tree attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Build {
    pub number: u64,
    #[serde(default)]
    pub event: String,
    #[serde(default)]
    pub source: String,
    pub status: Status,
    #[serde(default)]
    pub stages: Vec<Stage>,
}

/// One pipeline stage: a named group of steps.
///
/// The stage status aggregates its steps' outcomes; it is taken as given and
/// never recomputed here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stage {
    pub number: i64,
    #[serde(default)]
    pub name: String,
    pub status: Status,
    /// Error reason reported by the server, e.g. `Cancelled`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Start time, unix seconds.
    #[serde(default)]
    pub started: i64,
    /// Stop time, unix seconds.
    #[serde(default)]
    pub stopped: i64,
    /// Matrix environment for matrix-generated stages.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environ: BTreeMap<String, String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Stage {
    /// Wall-clock seconds between stage start and stop.
    pub fn elapsed_secs(&self) -> i64 {
        (self.stopped - self.started).max(0)
    }

    /// Human-facing stage name.
    ///
    /// Matrix-generated stages sometimes carry an empty name; fall back to
    /// the matrix environment joined as `key=value` pairs.
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            return self.name.clone();
        }
        self.environ
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One executed step inside a stage; the unit that produces a log.
///
/// Step names are the classification key and are not unique across a build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub number: i64,
    pub name: String,
    pub status: Status,
    #[serde(default)]
    pub exit_code: i32,
}

/// One line of raw log output for a step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub pos: i64,
    #[serde(default)]
    pub out: String,
}

/// Concatenates log lines, in order, into the raw log blob extraction runs
/// against. The `out` fields carry their own trailing newlines.
pub fn assemble_raw_log(lines: &[LogLine]) -> String {
    lines.iter().map(|line| line.out.as_str()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_deserializes_wire_strings() {
        let status: Status = serde_json::from_str("\"failure\"").unwrap();
        assert_eq!(status, Status::Failure);
        let status: Status = serde_json::from_str("\"killed\"").unwrap();
        assert_eq!(status, Status::Killed);
    }

    #[test]
    fn test_status_unknown_catch_all() {
        let status: Status = serde_json::from_str("\"waiting_on_dependencies\"").unwrap();
        assert_eq!(status, Status::Unknown);
        // Unknown states are scanned rather than silently dropped.
        assert!(status.build_needs_scan());
        assert!(status.step_needs_scan());
    }

    #[test]
    fn test_build_scan_short_circuit_states() {
        for status in [
            Status::Success,
            Status::Running,
            Status::Pending,
            Status::Skipped,
        ] {
            assert!(!status.build_needs_scan(), "{status} should short-circuit");
        }
        for status in [Status::Failure, Status::Error, Status::Cancelled] {
            assert!(status.build_needs_scan(), "{status} should be scanned");
        }
    }

    #[test]
    fn test_step_scan_skips_terminal_and_stopped_states() {
        for status in [
            Status::Success,
            Status::Skipped,
            Status::Cancelled,
            Status::Killed,
        ] {
            assert!(!status.step_needs_scan(), "{status} should be skipped");
        }
        assert!(Status::Failure.step_needs_scan());
        assert!(Status::Error.step_needs_scan());
    }

    #[test]
    fn test_assemble_raw_log_preserves_order_and_newlines() {
        let lines = vec![
            LogLine {
                pos: 0,
                out: "first\n".to_string(),
            },
            LogLine {
                pos: 1,
                out: "second\n".to_string(),
            },
        ];
        assert_eq!(assemble_raw_log(&lines), "first\nsecond\n");
        assert_eq!(assemble_raw_log(&[]), "");
    }

    #[test]
    fn test_stage_display_name_falls_back_to_matrix_environ() {
        let mut stage = Stage {
            number: 1,
            name: String::new(),
            status: Status::Failure,
            error: None,
            started: 0,
            stopped: 0,
            environ: BTreeMap::new(),
            steps: Vec::new(),
        };
        stage.environ.insert("DB".to_string(), "sqlite".to_string());
        stage.environ.insert("PHP".to_string(), "7.3".to_string());
        assert_eq!(stage.display_name(), "DB=sqlite, PHP=7.3");

        stage.name = "tests".to_string();
        assert_eq!(stage.display_name(), "tests");
    }

    #[test]
    fn test_stage_elapsed_never_negative() {
        let stage = Stage {
            number: 1,
            name: "tests".to_string(),
            status: Status::Cancelled,
            error: None,
            started: 100,
            stopped: 40,
            environ: BTreeMap::new(),
            steps: Vec::new(),
        };
        assert_eq!(stage.elapsed_secs(), 0);
    }
}
