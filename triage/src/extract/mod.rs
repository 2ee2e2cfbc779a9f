//! Per-strategy log excerpt extraction.
//!
//! One module per recognized step category, each a pure function from raw
//! log text to an [`ExtractionOutcome`]:
//!
//! - [`scenario`] — behaviour-test runs with a `--- Failed scenarios:` block
//! - [`phpunit`] — PHPUnit runs, summary-bounded and `FAILURES!`-bounded
//! - [`static_analysis`] — static analysis output as a trailing diff
//! - [`browser`] — headless-browser JS unit test failures
//! - [`compliance`] — repository compliance checks
//!
//! A strategy that cannot find its expected markers returns
//! [`ExtractionOutcome::Unrecognized`] with the raw log attached; it never
//! aborts the report. The one exception is the behaviour-test summary block:
//! its step name guarantees that format, so a missing marker is an
//! assumption violation surfaced as [`ExtractError`] for the caller to
//! escalate.

pub mod browser;
pub mod compliance;
pub mod phpunit;
pub mod scenario;
pub mod static_analysis;

mod util;

use drone_triage_core::ExtractionOutcome;

use crate::classify::Strategy;

/// Fixed notice attached to benign checkout failures. The log is never
/// inspected for these.
pub(crate) const CHECKOUT_NOTICE: &str =
    "transient checkout failure; rebuilding normally clears it";

/// Extraction failure that escalates instead of degrading to an
/// unrecognized outcome.
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    /// A step whose name guarantees a behaviour-test summary produced a log
    /// without the `--- Failed scenarios:` block.
    #[error("expected a '--- Failed scenarios:' block but found none")]
    ScenarioMarkerMissing {
        /// The full log, kept for diagnostic capture.
        raw_log: String,
    },
}

/// Runs the given strategy over the full raw log of one step.
pub fn run(strategy: Strategy, raw_log: &str) -> Result<ExtractionOutcome, ExtractError> {
    match strategy {
        Strategy::ScenarioBlock => scenario::extract(raw_log),
        Strategy::PhpUnitSummary => Ok(phpunit::summary(raw_log)),
        Strategy::PhpUnitFailuresBlock => Ok(phpunit::failures_block(raw_log)),
        Strategy::StaticAnalysisDiff => Ok(static_analysis::extract(raw_log)),
        Strategy::HeadlessBrowserFailures => Ok(browser::extract(raw_log)),
        Strategy::RepoComplianceChecks => Ok(compliance::extract(raw_log)),
        Strategy::BenignCheckoutFailure => Ok(ExtractionOutcome::Benign {
            reason: CHECKOUT_NOTICE.to_string(),
        }),
        Strategy::Unrecognized => Ok(unrecognized(raw_log)),
    }
}

pub(crate) fn unrecognized(raw_log: &str) -> ExtractionOutcome {
    ExtractionOutcome::Unrecognized {
        raw_log: raw_log.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benign_checkout_never_reads_the_log() {
        let outcome = run(Strategy::BenignCheckoutFailure, "fatal: reference is not a tree")
            .unwrap();
        assert_eq!(
            outcome,
            ExtractionOutcome::Benign {
                reason: CHECKOUT_NOTICE.to_string()
            }
        );
    }

    #[test]
    fn test_unrecognized_strategy_carries_raw_log() {
        let outcome = run(Strategy::Unrecognized, "some output").unwrap();
        assert_eq!(
            outcome,
            ExtractionOutcome::Unrecognized {
                raw_log: "some output".to_string()
            }
        );
    }

    #[test]
    fn test_no_strategy_panics_on_adversarial_input() {
        let inputs = ["", "\n", "\n\n\n", "--", "+", "There w", "\u{0}\u{ffff} binary-ish"];
        for strategy in [
            Strategy::PhpUnitSummary,
            Strategy::PhpUnitFailuresBlock,
            Strategy::StaticAnalysisDiff,
            Strategy::HeadlessBrowserFailures,
            Strategy::RepoComplianceChecks,
            Strategy::Unrecognized,
        ] {
            for input in inputs {
                run(strategy, input).unwrap();
            }
        }
    }
}
