//! Behaviour-test runs: the `--- Failed scenarios:` block.
//!
//! The runner prints a trailer listing each failing scenario as an absolute
//! feature-file path with a line number. The listing alone is not useful for
//! review, so each scenario is re-located in the body of the log and the
//! paragraph around its first occurrence becomes its excerpt.

use std::sync::LazyLock;

use regex::Regex;

use drone_triage_core::{ExtractionOutcome, LogExcerpt, ScenarioFailure};

use super::{ExtractError, util};

/// Block of one-or-more non-empty lines two newlines after the marker, up to
/// the next blank line.
static FAILED_SCENARIOS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--- Failed scenarios:\n\n((?:.+\n)+)\n").expect("static regex must compile")
});

/// Workspace mount the CI runner checks sources out under; stripped from
/// scenario paths to keep ids short.
const SOURCE_ROOT_PREFIX: &str = "/drone/src/";

pub(crate) fn extract(log: &str) -> Result<ExtractionOutcome, ExtractError> {
    let Some(captures) = FAILED_SCENARIOS_RE.captures(log) else {
        return Err(ExtractError::ScenarioMarkerMissing {
            raw_log: log.to_string(),
        });
    };

    let mut failures = Vec::new();
    for line in captures[1].lines() {
        let scenario = line.replace(' ', "").replace(SOURCE_ROOT_PREFIX, "");
        if scenario.is_empty() {
            continue;
        }
        // First occurrence in the log is the failure detail printed while
        // the scenario ran; the listing at the marker comes later.
        let excerpt = match log.find(&scenario) {
            Some(at) => util::enclosing_paragraph(log, at).to_string(),
            None => line.trim().to_string(),
        };
        failures.push(ScenarioFailure { scenario, excerpt });
    }

    Ok(ExtractionOutcome::Excerpt(LogExcerpt::Scenarios(failures)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_scenario_with_paragraph_excerpt() {
        let log = concat!(
            "Scenario: upload a file\n",
            "  Given a file foo/bar.feature:12 context\n",
            "  Then it fails\n",
            "\n",
            "other output\n",
            "\n",
            "--- Failed scenarios:\n",
            "\n",
            "foo/bar.feature:12\n",
            "\n",
            "1 scenario (1 failed)\n",
        );

        let outcome = extract(log).unwrap();
        let ExtractionOutcome::Excerpt(LogExcerpt::Scenarios(failures)) = outcome else {
            panic!("expected scenario excerpt");
        };
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].scenario, "foo/bar.feature:12");
        assert_eq!(
            failures[0].excerpt,
            "Scenario: upload a file\n  Given a file foo/bar.feature:12 context\n  Then it fails"
        );
    }

    #[test]
    fn test_strips_spaces_and_source_root_prefix() {
        let log = "\
Scenario: share\n\
detail for tests/acceptance/share.feature:3 here\n\
\n\
--- Failed scenarios:\n\
\n\
  /drone/src/tests/acceptance/share.feature:3\n\
\n";

        let outcome = extract(log).unwrap();
        let ExtractionOutcome::Excerpt(LogExcerpt::Scenarios(failures)) = outcome else {
            panic!("expected scenario excerpt");
        };
        assert_eq!(failures[0].scenario, "tests/acceptance/share.feature:3");
        assert!(failures[0].excerpt.starts_with("Scenario: share"));
    }

    #[test]
    fn test_multiple_scenarios_preserve_block_order() {
        let log = "\
first paragraph a.feature:1 text\n\
\n\
second paragraph b.feature:2 text\n\
\n\
--- Failed scenarios:\n\
\n\
b.feature:2\n\
a.feature:1\n\
\n";

        let outcome = extract(log).unwrap();
        let ExtractionOutcome::Excerpt(LogExcerpt::Scenarios(failures)) = outcome else {
            panic!("expected scenario excerpt");
        };
        let order: Vec<&str> = failures
            .iter()
            .map(|failure| failure.scenario.as_str())
            .collect();
        assert_eq!(order, ["b.feature:2", "a.feature:1"]);
    }

    #[test]
    fn test_missing_marker_is_an_error_not_a_panic() {
        let log = "build cancelled before the summary could print\n";
        let error = extract(log).unwrap_err();
        let ExtractError::ScenarioMarkerMissing { raw_log } = error;
        assert_eq!(raw_log, log);
    }

    #[test]
    fn test_marker_without_block_is_treated_as_missing() {
        // Truncated upload: marker printed, listing lost.
        let log = "--- Failed scenarios:\n";
        assert!(extract(log).is_err());
    }

    #[test]
    fn test_unlocatable_scenario_falls_back_to_listing_line() {
        let log = "\
unrelated output\n\
\n\
--- Failed scenarios:\n\
\n\
gone.feature: 7\n\
\n";

        let outcome = extract(log).unwrap();
        let ExtractionOutcome::Excerpt(LogExcerpt::Scenarios(failures)) = outcome else {
            panic!("expected scenario excerpt");
        };
        // "gone.feature:7" (spaces stripped) appears nowhere else in the log.
        assert_eq!(failures[0].scenario, "gone.feature:7");
        assert_eq!(failures[0].excerpt, "gone.feature: 7");
    }
}
