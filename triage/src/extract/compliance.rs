//! Repository compliance checks.
//!
//! Unlike the other strategies this is a multi-check accumulator: the step
//! bundles several independent checkers into one script, so the log is
//! probed for each checker's failure phrase and every hit appends its fixed
//! remediation text. Only when none of the phrases are present does the step
//! count as unrecognized, which routes it to telemetry.

use drone_triage_core::{ExtractionOutcome, LogExcerpt};

use super::unrecognized;

const AUTOLOADER_MARKER: &str = "autoloaders are not up to date";
const AUTOLOADER_ADVICE: &str = "The composer autoloaders are not up to date.\n\
Run build/autoloaderchecker.sh locally and commit the result.";

const CA_BUNDLE_MARKER: &str = "CA bundle is not up to date";
const CA_BUNDLE_ADVICE: &str = "The bundled CA root certificates are not up to date.\n\
Run build/ca-bundle-checker.sh locally and commit the result.";

const APP_COMPLIANCE_MARKER: &str = "App is not compliant";
const APP_COMPLIANCE_ADVICE: &str = "At least one bundled app failed the code compliance check:";

/// Start of one app's checker section; the last one before the failure
/// phrase belongs to the failing app.
const TESTING_MARKER: &str = "Testing";

/// Chatter printed for every passing app, stripped from the excerpt.
const COMPLIANT_CHATTER: &str = "App is compliant - awesome job!";

/// Loader notice for apps absent from the install, normalized to a short
/// parenthetical.
const NOT_INSTALLED_RAW: &str = "Could not load app, it is not installed.";
const NOT_INSTALLED_NOTE: &str = "(app is not installed)";

pub(crate) fn extract(log: &str) -> ExtractionOutcome {
    let mut sections: Vec<String> = Vec::new();

    if log.contains(AUTOLOADER_MARKER) {
        sections.push(AUTOLOADER_ADVICE.to_string());
    }
    if log.contains(CA_BUNDLE_MARKER) {
        sections.push(CA_BUNDLE_ADVICE.to_string());
    }
    if let Some(at) = log.find(APP_COMPLIANCE_MARKER) {
        let mut section = APP_COMPLIANCE_ADVICE.to_string();
        if let Some(testing) = log[..at].rfind(TESTING_MARKER) {
            let cleaned = log[testing..at]
                .replace(NOT_INSTALLED_RAW, NOT_INSTALLED_NOTE)
                .replace(COMPLIANT_CHATTER, "");
            let cleaned = cleaned.trim();
            if !cleaned.is_empty() {
                section.push('\n');
                section.push_str(cleaned);
            }
        }
        sections.push(section);
    }

    if sections.is_empty() {
        return unrecognized(log);
    }
    ExtractionOutcome::Excerpt(LogExcerpt::Text(sections.join("\n\n")))
}
