//! Failure-log triage for CI builds.
//!
//! Given a build composed of nested stages and steps, this crate identifies
//! which steps failed and extracts the diagnostically relevant excerpt from
//! each step's raw log instead of dumping the whole thing. Step names select
//! the extraction strategy ([`classify`]), strategies degrade to a
//! structured unrecognized outcome instead of crashing on malformed input
//! ([`extract`]), and the scanner ([`scan`]) walks whole builds or a backlog
//! of them into ordered [`FailureReport`]s.
//!
//! # Main entry points
//!
//! - [`triage_step_log`] — classify one step by name and excerpt its raw
//!   log, no server involved.
//! - [`scan::Scanner`] — scan a fetched build snapshot (or a whole backlog)
//!   through an injected [`drone::BuildSource`].
//!
//! # Example
//!
//! ```
//! use drone_triage::triage_step_log;
//! use drone_triage_core::{ExtractionOutcome, LogExcerpt};
//!
//! let log = "\
//! PHPUnit 9.5.10 by Sebastian Bergmann and contributors.
//!
//! There was 1 failure:
//!
//! 1) FilesTest::testUpload
//! Failed asserting that false is true.
//!
//! --
//!
//! skipped tests:
//! ";
//!
//! let outcome = triage_step_log("sqlite-php7.3", log).unwrap();
//! match outcome {
//!     ExtractionOutcome::Excerpt(LogExcerpt::Text(text)) => {
//!         assert!(text.starts_with("There was 1 failure:"));
//!         assert!(text.contains("FilesTest::testUpload"));
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```
//!
//! # Crate type
//!
//! This is a **library-only crate** with no binary targets. For CLI usage,
//! use the `drone-triage-cli` crate which provides the `drone-triage`
//! binary.
//!
//! [`FailureReport`]: drone_triage_core::FailureReport
//! [`classify`]: classify::classify

pub mod classify;
pub mod config;
pub mod drone;
pub mod extract;
pub mod render;
pub mod report;
pub mod scan;
pub mod telemetry;

use drone_triage_core::ExtractionOutcome;

use extract::ExtractError;

/// Classifies a step by its name and extracts the relevant excerpt from its
/// raw log.
///
/// This is the pure core of the crate: no fetching, no telemetry. The only
/// error case is a behaviour-test step whose log is missing the scenario
/// summary its name guarantees; every other mismatch comes back as
/// [`ExtractionOutcome::Unrecognized`].
pub fn triage_step_log(step_name: &str, raw_log: &str) -> Result<ExtractionOutcome, ExtractError> {
    extract::run(classify::classify(step_name), raw_log)
}

#[cfg(test)]
mod tests {
    use drone_triage_core::{ExtractionOutcome, LogExcerpt};

    use super::*;

    #[test]
    fn test_unknown_step_name_yields_unrecognized_with_raw_log() {
        let outcome = triage_step_log("brand-new-step", "some log").unwrap();
        assert_eq!(
            outcome,
            ExtractionOutcome::Unrecognized {
                raw_log: "some log".to_string()
            }
        );
    }

    #[test]
    fn test_checkout_step_is_benign_without_reading_the_log() {
        let outcome = triage_step_log("git", "fatal: early EOF").unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Benign { .. }));
    }

    #[test]
    fn test_acceptance_step_without_marker_escalates() {
        assert!(triage_step_log("acceptance-app-files", "no summary here").is_err());
    }

    #[test]
    fn test_jsunit_step_with_quiet_log_yields_empty_excerpt() {
        let outcome = triage_step_log("jsunit", "INFO all good\n").unwrap();
        assert_eq!(
            outcome,
            ExtractionOutcome::Excerpt(LogExcerpt::Text(String::new()))
        );
    }
}
