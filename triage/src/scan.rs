//! Build scanning.
//!
//! Walks a build snapshot stage by stage, step by step, and produces one
//! outcome per step needing attention. The walk order is part of the report
//! semantics (the report reads top-to-bottom in CI execution order), so the
//! per-step log fetch + extraction fans out over a bounded worker pool and
//! the results are stitched back in encounter order.
//!
//! Error policy:
//!
//! - transport failures fetching builds are fatal for that build;
//! - a failed log fetch for one step is absorbed as
//!   [`StepOutcome::LogUnavailable`] and the scan continues;
//! - an unrecognized log format is an outcome, not an error, and is
//!   reported to telemetry as a side effect;
//! - a behaviour-test step without its scenario summary means the
//!   classification assumption broke, which aborts the build's scan rather
//!   than emit a misleadingly empty report.

use rayon::prelude::*;
use tracing::{debug, warn};

use drone_triage_core::{
    Build, FailureReport, Stage, Step, StepOutcome, StepReport, assemble_raw_log,
    ExtractionOutcome,
};

use crate::classify::{Strategy, classify};
use crate::drone::{ApiError, BuildSource};
use crate::extract::{self, ExtractError};
use crate::report::ReportAssembler;
use crate::telemetry::{TelemetryNotifier, UnrecognizedFormat};

/// Wall-clock budget after which a cancelled stage counts as timed out.
pub const DEFAULT_STAGE_TIMEOUT_SECS: i64 = 1800;

/// Error reason the server records on stages it cancelled.
const CANCELLED_ERROR_REASON: &str = "Cancelled";

/// Tuning for one scanner instance.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Seconds a cancelled stage must have run to count as timed out.
    pub stage_timeout_secs: i64,
    /// Worker pool size for per-step log fetches (`None` = adaptive).
    pub jobs: Option<usize>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            jobs: None,
        }
    }
}

/// Fatal error for one build's scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error(transparent)]
    Transport(#[from] ApiError),

    /// A step name guaranteed a log format the log did not have.
    #[error("build {build}, stage '{stage}', step '{step}': {source}")]
    MalformedLog {
        build: u64,
        stage: String,
        step: String,
        #[source]
        source: ExtractError,
    },
}

/// A build whose backlog scan failed, identified for the run summary.
#[derive(Debug)]
pub struct BuildFailure {
    pub build: u64,
    pub error: ScanError,
}

/// Outcome of scanning a backlog of builds: every build is attempted, and a
/// single build's fatal error never stops the rest.
#[derive(Debug)]
pub struct BacklogOutcome {
    pub reports: Vec<FailureReport>,
    pub failures: Vec<BuildFailure>,
}

enum StagePlan<'b> {
    TimedOut(&'b Stage),
    Steps(&'b Stage, Vec<&'b Step>),
}

/// Scans builds into failure reports.
pub struct Scanner<'a> {
    source: &'a dyn BuildSource,
    telemetry: &'a dyn TelemetryNotifier,
    options: ScanOptions,
}

impl<'a> Scanner<'a> {
    pub fn new(
        source: &'a dyn BuildSource,
        telemetry: &'a dyn TelemetryNotifier,
        options: ScanOptions,
    ) -> Self {
        Self {
            source,
            telemetry,
            options,
        }
    }

    /// Scans one build snapshot into its failure report.
    ///
    /// Successful, pending, running, and skipped builds short-circuit to an
    /// empty report without any step-level work.
    pub fn scan_build(&self, build: &Build) -> Result<FailureReport, ScanError> {
        let mut assembler = ReportAssembler::new(build);

        if !build.status.build_needs_scan() {
            debug!(build = build.number, status = %build.status, "build needs no report");
            return Ok(assembler.finish());
        }

        // Plan first: terminal-good stages drop out, then the
        // timeout-cancellation check, then step selection.
        let mut plan: Vec<StagePlan<'_>> = Vec::new();
        for stage in &build.stages {
            if !stage.status.stage_needs_scan() {
                continue;
            }
            if self.stage_timed_out(stage) {
                debug!(build = build.number, stage = %stage.name, "stage timed out, skipping its steps");
                plan.push(StagePlan::TimedOut(stage));
                continue;
            }
            let steps: Vec<&Step> = stage
                .steps
                .iter()
                .filter(|step| step.status.step_needs_scan())
                .collect();
            plan.push(StagePlan::Steps(stage, steps));
        }

        let work: Vec<(usize, &Stage, &Step)> = plan
            .iter()
            .enumerate()
            .flat_map(|(index, entry)| match entry {
                StagePlan::TimedOut(_) => Vec::new(),
                StagePlan::Steps(stage, steps) => steps
                    .iter()
                    .map(|step| (index, *stage, *step))
                    .collect::<Vec<_>>(),
            })
            .collect();

        let step_reports: Vec<(usize, StepReport)> = if work.is_empty() {
            Vec::new()
        } else {
            let jobs = self.parallel_jobs(work.len());
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(jobs)
                .build()
                .expect("failed to build rayon thread pool");
            // Collecting into Result keeps input order for the Ok case and
            // stops issuing further fetches once a fatal error is seen.
            pool.install(|| {
                work.par_iter()
                    .map(|(index, stage, step)| {
                        self.scan_step(build, stage, step)
                            .map(|report| (*index, report))
                    })
                    .collect::<Result<Vec<_>, ScanError>>()
            })?
        };

        let mut remaining = step_reports.into_iter().peekable();
        for (index, entry) in plan.iter().enumerate() {
            match entry {
                StagePlan::TimedOut(stage) => assembler.record_timeout(stage),
                StagePlan::Steps(stage, steps) => {
                    let mut reports = Vec::with_capacity(steps.len());
                    while remaining.peek().is_some_and(|(owner, _)| *owner == index) {
                        if let Some((_, report)) = remaining.next() {
                            reports.push(report);
                        }
                    }
                    assembler.record_stage(stage, reports);
                }
            }
        }

        Ok(assembler.finish())
    }

    /// Scans every build on `source_ref` from `min_build` upward.
    ///
    /// Listing failures are fatal for the whole run; per-build failures are
    /// collected and the remaining builds still run.
    pub fn scan_backlog(
        &self,
        source_ref: &str,
        min_build: u64,
    ) -> Result<BacklogOutcome, ApiError> {
        let mut summaries = self.source.list_builds()?;
        summaries.retain(|summary| summary.number >= min_build && summary.source == source_ref);
        summaries.sort_by_key(|summary| summary.number);

        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for summary in summaries {
            if !summary.status.build_needs_scan() {
                continue;
            }
            let result = self
                .source
                .build(summary.number)
                .map_err(ScanError::from)
                .and_then(|build| self.scan_build(&build));
            match result {
                Ok(report) => reports.push(report),
                Err(error) => {
                    warn!(build = summary.number, error = %error, "build scan failed, continuing backlog");
                    failures.push(BuildFailure {
                        build: summary.number,
                        error,
                    });
                }
            }
        }

        Ok(BacklogOutcome { reports, failures })
    }

    fn scan_step(
        &self,
        build: &Build,
        stage: &Stage,
        step: &Step,
    ) -> Result<StepReport, ScanError> {
        let strategy = classify(&step.name);
        debug!(
            build = build.number,
            stage = %stage.display_name(),
            step = %step.name,
            strategy = %strategy,
            "scanning step"
        );

        // Benign outcomes never inspect the log, so skip the fetch.
        if strategy == Strategy::BenignCheckoutFailure {
            return Ok(StepReport {
                name: step.name.clone(),
                status: step.status,
                outcome: StepOutcome::Benign {
                    reason: extract::CHECKOUT_NOTICE.to_string(),
                },
            });
        }

        let raw_log = match self.source.step_log(build.number, stage.number, step.number) {
            Ok(lines) => assemble_raw_log(&lines),
            Err(error) => {
                warn!(build = build.number, step = %step.name, error = %error, "log fetch failed, continuing");
                return Ok(StepReport {
                    name: step.name.clone(),
                    status: step.status,
                    outcome: StepOutcome::LogUnavailable {
                        error: error.to_string(),
                    },
                });
            }
        };

        let extraction =
            extract::run(strategy, &raw_log).map_err(|source| ScanError::MalformedLog {
                build: build.number,
                stage: stage.display_name(),
                step: step.name.clone(),
                source,
            })?;

        if matches!(extraction, ExtractionOutcome::Unrecognized { .. }) {
            self.notify_unrecognized(build, stage, step);
        }

        Ok(StepReport {
            name: step.name.clone(),
            status: step.status,
            outcome: extraction.into(),
        })
    }

    fn notify_unrecognized(&self, build: &Build, stage: &Stage, step: &Step) {
        let event = UnrecognizedFormat {
            step_name: &step.name,
            stage,
            step,
            diagnostic_url: self
                .source
                .diagnostic_url(build.number, stage.number, step.number),
        };
        if let Err(error) = self.telemetry.notify_unrecognized(&event) {
            warn!(step = %step.name, error = %error, "telemetry notification failed");
        }
    }

    fn stage_timed_out(&self, stage: &Stage) -> bool {
        stage.error.as_deref() == Some(CANCELLED_ERROR_REASON)
            && stage.elapsed_secs() > self.options.stage_timeout_secs
    }

    fn parallel_jobs(&self, work_len: usize) -> usize {
        let requested = self.options.jobs.filter(|jobs| *jobs > 0);
        let jobs = requested.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|parallelism| parallelism.get())
                .unwrap_or(4)
                .min(8)
        });
        jobs.min(work_len.max(1))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use drone_triage_core::{BuildSummary, LogLine, Status};

    use crate::telemetry::NoTelemetry;

    use super::*;

    struct NullSource;

    impl BuildSource for NullSource {
        fn list_builds(&self) -> Result<Vec<BuildSummary>, ApiError> {
            Ok(Vec::new())
        }

        fn build(&self, number: u64) -> Result<Build, ApiError> {
            Ok(Build {
                number,
                event: "push".to_string(),
                source: "refs/heads/master".to_string(),
                status: Status::Success,
                stages: Vec::new(),
            })
        }

        fn step_log(&self, _build: u64, _stage: i64, _step: i64) -> Result<Vec<LogLine>, ApiError> {
            Ok(Vec::new())
        }

        fn diagnostic_url(&self, build: u64, stage: i64, step: i64) -> String {
            format!("null://{build}/{stage}/{step}")
        }
    }

    fn scanner(options: ScanOptions) -> Scanner<'static> {
        static SOURCE: NullSource = NullSource;
        static TELEMETRY: NoTelemetry = NoTelemetry;
        Scanner::new(&SOURCE, &TELEMETRY, options)
    }

    fn cancelled_stage(elapsed: i64, error: Option<&str>) -> Stage {
        Stage {
            number: 1,
            name: "tests".to_string(),
            status: Status::Failure,
            error: error.map(str::to_string),
            started: 1000,
            stopped: 1000 + elapsed,
            environ: BTreeMap::new(),
            steps: Vec::new(),
        }
    }

    #[test]
    fn test_stage_timeout_requires_cancelled_reason_and_budget_overrun() {
        let scanner = scanner(ScanOptions::default());
        assert!(scanner.stage_timed_out(&cancelled_stage(1801, Some("Cancelled"))));
        assert!(!scanner.stage_timed_out(&cancelled_stage(1800, Some("Cancelled"))));
        assert!(!scanner.stage_timed_out(&cancelled_stage(1801, None)));
        assert!(!scanner.stage_timed_out(&cancelled_stage(1801, Some("OOM"))));
    }

    #[test]
    fn test_stage_timeout_threshold_is_configurable() {
        let scanner = scanner(ScanOptions {
            stage_timeout_secs: 60,
            jobs: None,
        });
        assert!(scanner.stage_timed_out(&cancelled_stage(61, Some("Cancelled"))));
        assert!(!scanner.stage_timed_out(&cancelled_stage(59, Some("Cancelled"))));
    }

    #[test]
    fn test_parallel_jobs_bounded_by_workload_and_request() {
        let scanner = scanner(ScanOptions {
            stage_timeout_secs: DEFAULT_STAGE_TIMEOUT_SECS,
            jobs: Some(4),
        });
        assert_eq!(scanner.parallel_jobs(2), 2);
        assert_eq!(scanner.parallel_jobs(100), 4);
        assert_eq!(scanner.parallel_jobs(0), 1);

        let adaptive = self::scanner(ScanOptions::default());
        assert!(adaptive.parallel_jobs(100) >= 1);
        assert!(adaptive.parallel_jobs(100) <= 8);
    }
}
