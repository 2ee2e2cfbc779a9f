//! Headless-browser JS unit tests.
//!
//! The test runner prefixes every browser-side message with the browser
//! name; a failure is that line plus the indented stack/diff lines that
//! follow it. No matching blocks is not an error: a red step with nothing
//! printed per-browser tells the reader the run died before the suite, and
//! an empty excerpt carries exactly that.

use drone_triage_core::{ExtractionOutcome, LogExcerpt};

/// Line prefix of browser-side runner output.
const RUNNER_PREFIX: &str = "PhantomJS";

/// Block printed when the runner binary is missing; launcher noise, not a
/// test failure.
const RUNNER_NOT_FOUND_NOTICE: &str = "PhantomJS was not found.";

pub(crate) fn extract(log: &str) -> ExtractionOutcome {
    let mut blocks: Vec<String> = Vec::new();
    let mut lines = log.lines().peekable();

    while let Some(line) = lines.next() {
        if !line.starts_with(RUNNER_PREFIX) {
            continue;
        }
        let mut block = vec![line];
        while let Some(&next) = lines.peek() {
            if next.starts_with(' ') || next.starts_with('\t') {
                block.push(next);
                lines.next();
            } else {
                break;
            }
        }
        let content = block.join("\n");
        if content == RUNNER_NOT_FOUND_NOTICE {
            continue;
        }
        blocks.push(content);
    }

    ExtractionOutcome::Excerpt(LogExcerpt::Text(blocks.join("\n")))
}
