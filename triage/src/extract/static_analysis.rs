//! Static analysis steps reporting new issues as a trailing diff.
//!
//! The step diffs the run's issue list against the committed baseline and
//! prints the diff last, so everything after the final added line is the
//! interesting part. An empty tail means the diff was clean apart from the
//! marker line itself, which is still a valid (empty) excerpt.

use drone_triage_core::{ExtractionOutcome, LogExcerpt};

use super::unrecognized;

/// A line beginning with `+`, i.e. an addition row in the trailing diff.
const ADDED_LINE_MARKER: &str = "\n+";

/// Continuation prefix so the excerpt reads as the tail of a longer diff.
const CONTINUATION: char = '$';

pub(crate) fn extract(log: &str) -> ExtractionOutcome {
    match log.rfind(ADDED_LINE_MARKER) {
        Some(idx) => {
            let tail = &log[idx + ADDED_LINE_MARKER.len()..];
            ExtractionOutcome::Excerpt(LogExcerpt::Text(format!("{CONTINUATION}{tail}")))
        }
        None => unrecognized(log),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_excerpt_starts_after_last_added_line() {
        let log = "\
baseline check\n\
+old/issue.php:10 UndeclaredVariable\n\
intermediate output\n\
+new/issue.php:42 TypeMismatch $value\n";
        let ExtractionOutcome::Excerpt(LogExcerpt::Text(text)) = extract(log) else {
            panic!("expected text excerpt");
        };
        assert_eq!(text, "$new/issue.php:42 TypeMismatch $value\n");
    }

    #[test]
    fn test_empty_tail_is_a_valid_empty_excerpt() {
        let log = "diff done\n+";
        let ExtractionOutcome::Excerpt(LogExcerpt::Text(text)) = extract(log) else {
            panic!("expected text excerpt");
        };
        assert_eq!(text, "$");
    }

    #[test]
    fn test_plus_must_follow_a_newline() {
        let log = "1+1=2, no diff here\n";
        assert_eq!(
            extract(log),
            ExtractionOutcome::Unrecognized {
                raw_log: log.to_string()
            }
        );
    }

    #[test]
    fn test_no_marker_is_unrecognized() {
        assert!(matches!(
            extract("analysis passed\n"),
            ExtractionOutcome::Unrecognized { .. }
        ));
    }
}
