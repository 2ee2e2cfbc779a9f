//! PHPUnit runs.
//!
//! Both variants anchor on the first summary line (`There was 1 failure:`,
//! `There were 3 errors:`, …). The unit-test matrix prints a skipped-tests
//! listing after the failures, separated by a `--` divider; the excerpt stops
//! at the last divider before that listing. Service-backed integration runs
//! print the `FAILURES!` banner instead, which bounds the excerpt directly.

use drone_triage_core::{ExtractionOutcome, LogExcerpt};

use super::{unrecognized, util};

/// Line prefix shared by `There was …` and `There were …` summary lines.
const SUMMARY_MARKER: &str = "There w";
const SKIPPED_MARKER: &str = "skipped tests:";
const DIVIDER: &str = "--";
const FAILURES_BANNER: &str = "FAILURES!";

pub(crate) fn summary(log: &str) -> ExtractionOutcome {
    let Some(start) = util::find_line_start(log, SUMMARY_MARKER) else {
        return unrecognized(log);
    };
    let Some(skipped) = log[start..].find(SKIPPED_MARKER).map(|idx| start + idx) else {
        return unrecognized(log);
    };
    let Some(divider) = log[..skipped].rfind(DIVIDER) else {
        return unrecognized(log);
    };
    if divider <= start {
        return unrecognized(log);
    }
    ExtractionOutcome::Excerpt(LogExcerpt::Text(log[start..divider].trim_end().to_string()))
}

pub(crate) fn failures_block(log: &str) -> ExtractionOutcome {
    let Some(start) = util::find_line_start(log, SUMMARY_MARKER) else {
        return unrecognized(log);
    };
    let Some(end) = log[start..].find(FAILURES_BANNER).map(|idx| start + idx) else {
        return unrecognized(log);
    };
    ExtractionOutcome::Excerpt(LogExcerpt::Text(log[start..end].trim_end().to_string()))
}
