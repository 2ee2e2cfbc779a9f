//! Step-name classification.
//!
//! Maps a step's declared name to the extraction strategy that applies.
//! Classification is a total function: every name resolves to exactly one
//! [`Strategy`], falling through to [`Strategy::Unrecognized`] when nothing
//! matches. Matching uses only exact names, name prefixes, and set
//! membership — never patterns over the name — so lookups stay O(1)
//! amortized and deterministic.
//!
//! The name sets are data, not control flow: adding a CI matrix entry means
//! adding a string to a table below.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Extraction strategy selected for a step name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Behaviour-test runner with a `--- Failed scenarios:` summary.
    ScenarioBlock,
    /// PHPUnit run summarized between `There w…` and the skipped-tests
    /// listing.
    PhpUnitSummary,
    /// PHPUnit run bounded by the `FAILURES!` banner.
    PhpUnitFailuresBlock,
    /// Static analysis step reporting new issues as a trailing diff.
    StaticAnalysisDiff,
    /// Headless-browser JS unit tests.
    HeadlessBrowserFailures,
    /// Repository compliance checks (autoloader, CA bundle, app code).
    RepoComplianceChecks,
    /// Source checkout; failures here are transient and reported tersely.
    BenignCheckoutFailure,
    /// No strategy is bound to this name.
    Unrecognized,
}

impl Strategy {
    /// Stable label used in logs and telemetry payloads.
    pub fn label(self) -> &'static str {
        match self {
            Strategy::ScenarioBlock => "scenario-block",
            Strategy::PhpUnitSummary => "phpunit-summary",
            Strategy::PhpUnitFailuresBlock => "phpunit-failures-block",
            Strategy::StaticAnalysisDiff => "static-analysis-diff",
            Strategy::HeadlessBrowserFailures => "headless-browser-failures",
            Strategy::RepoComplianceChecks => "repo-compliance-checks",
            Strategy::BenignCheckoutFailure => "benign-checkout-failure",
            Strategy::Unrecognized => "unrecognized",
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Acceptance-test family prefixes (behaviour-test steps).
const ACCEPTANCE_PREFIX: &str = "acceptance";
const INTEGRATION_PREFIX: &str = "integration-";

/// Coverage-enabled variants of the unit-test matrix.
const CODECOV_SUFFIX: &str = "-codecov";

/// The source checkout step.
const CHECKOUT_STEP: &str = "git";

const PHAN_STEP: &str = "phan";
const JSUNIT_STEP: &str = "jsunit";
const CHECKERS_STEP: &str = "checkers";

/// Unit/integration test matrix steps whose PHPUnit output is summarized
/// down to the failure block before the skipped-tests listing.
static PHPUNIT_SUMMARY_STEPS: &[&str] = &[
    "nodb-php7.2",
    "nodb-php7.3",
    "nodb-php7.4",
    "sqlite-php7.2",
    "sqlite-php7.3",
    "sqlite-php7.4",
    "mysql5.6-php7.2",
    "mysql5.6-php7.3",
    "mysql5.7-php7.2",
    "mysql5.7-php7.3",
    "mysql8.0-php7.2",
    "mysql8.0-php7.3",
    "mysql8.0-php7.4",
    "mysqlmb4-php7.2",
    "mysqlmb4-php7.3",
    "mariadb10.1-php7.2",
    "mariadb10.2-php7.3",
    "mariadb10.3-php7.3",
    "mariadb10.4-php7.3",
    "postgres9.6-php7.2",
    "postgres10-php7.3",
    "postgres11-php7.3",
    "oci-php7.2",
    "oci-php7.3",
];

/// Service-backed integration steps whose PHPUnit output is bounded by the
/// `FAILURES!` banner instead.
static PHPUNIT_FAILURES_STEPS: &[&str] = &[
    "memcache-memcached",
    "memcache-redis",
    "memcache-redis-cluster",
    "sqlite-php7.3-samba-native",
    "sqlite-php7.3-samba-non-native",
    "sqlite-php7.3-webdav-apache",
];

static PHPUNIT_SUMMARY_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PHPUNIT_SUMMARY_STEPS.iter().copied().collect());

static PHPUNIT_FAILURES_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| PHPUNIT_FAILURES_STEPS.iter().copied().collect());

/// Resolves the extraction strategy for a step name. First match wins.
pub fn classify(step_name: &str) -> Strategy {
    if step_name.starts_with(ACCEPTANCE_PREFIX) || step_name.starts_with(INTEGRATION_PREFIX) {
        return Strategy::ScenarioBlock;
    }
    if PHPUNIT_SUMMARY_SET.contains(step_name) || step_name.ends_with(CODECOV_SUFFIX) {
        return Strategy::PhpUnitSummary;
    }
    if PHPUNIT_FAILURES_SET.contains(step_name) {
        return Strategy::PhpUnitFailuresBlock;
    }
    match step_name {
        PHAN_STEP => Strategy::StaticAnalysisDiff,
        JSUNIT_STEP => Strategy::HeadlessBrowserFailures,
        CHECKERS_STEP => Strategy::RepoComplianceChecks,
        CHECKOUT_STEP => Strategy::BenignCheckoutFailure,
        _ => Strategy::Unrecognized,
    }
}
