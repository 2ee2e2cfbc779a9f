//! Report assembly.
//!
//! Pure aggregation in encounter order. Nothing is deduplicated: the same
//! scenario id failing in two steps is two rows, and that repetition is the
//! signal a reader uses to spot flaky tests.

use drone_triage_core::{
    Build, FailureReport, Stage, StageOutcome, StageReport, StatusCounts, StepReport,
};

/// Accumulates stage/step outcomes into a [`FailureReport`].
pub struct ReportAssembler {
    report: FailureReport,
}

impl ReportAssembler {
    /// Starts a report for the given build, tallying its step statuses.
    pub fn new(build: &Build) -> Self {
        let mut step_counts = StatusCounts::default();
        for stage in &build.stages {
            for step in &stage.steps {
                step_counts.record(step.status);
            }
        }
        Self {
            report: FailureReport {
                build: build.number,
                event: build.event.clone(),
                source: build.source.clone(),
                status: build.status,
                step_counts,
                stages: Vec::new(),
            },
        }
    }

    /// Records a stage that was cancelled over the wall-clock budget.
    pub fn record_timeout(&mut self, stage: &Stage) {
        self.report.stages.push(StageReport {
            name: stage.display_name(),
            status: stage.status,
            outcome: StageOutcome::TimedOut {
                elapsed_secs: stage.elapsed_secs(),
            },
        });
    }

    /// Records a scanned stage with its per-step outcomes, in step order.
    pub fn record_stage(&mut self, stage: &Stage, steps: Vec<StepReport>) {
        self.report.stages.push(StageReport {
            name: stage.display_name(),
            status: stage.status,
            outcome: StageOutcome::Steps(steps),
        });
    }

    pub fn finish(self) -> FailureReport {
        self.report
    }
}
