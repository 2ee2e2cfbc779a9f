//! Core data model for CI build failure triage.
//!
//! This crate defines the types shared between the triage engine and its
//! consumers:
//!
//! - [`Build`], [`Stage`], [`Step`] — the immutable build snapshot as
//!   fetched from the CI server, with [`Status`] at every level.
//! - [`LogLine`] / [`assemble_raw_log`] — raw log assembly for one step.
//! - [`ExtractionOutcome`], [`LogExcerpt`], [`StepOutcome`] — what the
//!   extraction engine produced for one failing step.
//! - [`FailureReport`] — the ordered, read-only report for one build.
//!
//! # Example
//!
//! ```
//! use drone_triage_core::*;
//!
//! let outcome = StepOutcome::Excerpt(LogExcerpt::Text(
//!     "There was 1 failure:\n\n1) FilesTest::testUpload".to_string(),
//! ));
//! assert_eq!(outcome.summary(), "There was 1 failure:");
//! assert!(outcome.detail().contains("FilesTest::testUpload"));
//! ```

mod report;
mod types;

pub use report::{
    ExtractionOutcome, FailureReport, LogExcerpt, ScenarioFailure, StageOutcome, StageReport,
    StatusCounts, StepOutcome, StepReport,
};
pub use types::{Build, BuildSummary, LogLine, Stage, Status, Step, assemble_raw_log};
