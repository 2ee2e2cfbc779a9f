//! YAML configuration for a triage run.
//!
//! Controls which server and repository are scanned, how far back the
//! backlog goes, and the scan tuning knobs. The API token can live in the
//! file or in the `DRONE_TOKEN` environment variable; the environment wins
//! only when the file has none.
//!
//! # Example YAML
//!
//! ```yaml
//! server:
//!   url: https://drone.example.com
//!   repo: example/server
//! scan:
//!   source_ref: refs/heads/master
//!   min_build: 16000
//!   stage_timeout_secs: 1800
//!   log_timeout_secs: 30
//!   jobs: 4
//! telemetry:
//!   url: https://hooks.example.com/triage
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::scan::DEFAULT_STAGE_TIMEOUT_SECS;

/// Environment variable consulted when the config file carries no token.
pub const TOKEN_ENV_VAR: &str = "DRONE_TOKEN";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("no API token: set server.token or the {TOKEN_ENV_VAR} environment variable")]
    MissingToken,
}

/// CI server coordinates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the Drone server.
    pub url: String,
    /// Repository slug, `owner/name`.
    pub repo: String,
    /// Bearer token. Prefer the environment variable for anything shared.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Scan tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Ref the backlog scan is limited to.
    #[serde(default = "default_source_ref")]
    pub source_ref: String,
    /// Oldest build number the backlog scan reaches back to.
    #[serde(default)]
    pub min_build: u64,
    /// Seconds a cancelled stage must have run to count as timed out.
    #[serde(default = "default_stage_timeout_secs")]
    pub stage_timeout_secs: i64,
    /// Per-call timeout for build and log fetches.
    #[serde(default = "default_log_timeout_secs")]
    pub log_timeout_secs: u64,
    /// Worker pool size for per-step fetches (`None` = adaptive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jobs: Option<usize>,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            source_ref: default_source_ref(),
            min_build: 0,
            stage_timeout_secs: default_stage_timeout_secs(),
            log_timeout_secs: default_log_timeout_secs(),
            jobs: None,
        }
    }
}

/// Optional webhook for unrecognized-format diagnostics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriageConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telemetry: Option<TelemetryConfig>,
}

impl TriageConfig {
    /// Loads and parses the YAML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_yaml::from_str(&raw)?)
    }

    /// Resolves the API token from the file or the given environment value.
    pub fn resolve_token(&self, env_token: Option<String>) -> Result<String, ConfigError> {
        self.server
            .token
            .clone()
            .filter(|token| !token.is_empty())
            .or_else(|| env_token.filter(|token| !token.is_empty()))
            .ok_or(ConfigError::MissingToken)
    }
}

fn default_source_ref() -> String {
    "refs/heads/master".to_string()
}

fn default_stage_timeout_secs() -> i64 {
    DEFAULT_STAGE_TIMEOUT_SECS
}

fn default_log_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: TriageConfig = serde_yaml::from_str(
            "server:\n  url: https://drone.example.com\n  repo: example/server\n",
        )
        .unwrap();
        assert_eq!(config.scan.source_ref, "refs/heads/master");
        assert_eq!(config.scan.min_build, 0);
        assert_eq!(config.scan.stage_timeout_secs, DEFAULT_STAGE_TIMEOUT_SECS);
        assert_eq!(config.scan.log_timeout_secs, 30);
        assert!(config.scan.jobs.is_none());
        assert!(config.telemetry.is_none());
    }

    #[test]
    fn test_full_config_round_trips_through_file() {
        let yaml = "\
server:
  url: https://drone.example.com
  repo: example/server
  token: sekrit
scan:
  source_ref: refs/heads/stable
  min_build: 16000
  stage_timeout_secs: 900
  log_timeout_secs: 10
  jobs: 2
telemetry:
  url: https://hooks.example.com/triage
";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = TriageConfig::load(file.path()).unwrap();
        assert_eq!(config.server.repo, "example/server");
        assert_eq!(config.scan.source_ref, "refs/heads/stable");
        assert_eq!(config.scan.min_build, 16000);
        assert_eq!(config.scan.jobs, Some(2));
        assert_eq!(
            config.telemetry.as_ref().map(|t| t.url.as_str()),
            Some("https://hooks.example.com/triage")
        );
        assert_eq!(config.resolve_token(None).unwrap(), "sekrit");
    }

    #[test]
    fn test_env_token_fills_in_when_file_has_none() {
        let config: TriageConfig = serde_yaml::from_str(
            "server:\n  url: https://drone.example.com\n  repo: example/server\n",
        )
        .unwrap();
        assert_eq!(
            config.resolve_token(Some("from-env".to_string())).unwrap(),
            "from-env"
        );
        assert!(matches!(
            config.resolve_token(None),
            Err(ConfigError::MissingToken)
        ));
        assert!(matches!(
            config.resolve_token(Some(String::new())),
            Err(ConfigError::MissingToken)
        ));
    }

    #[test]
    fn test_file_token_wins_over_environment() {
        let config: TriageConfig = serde_yaml::from_str(
            "server:\n  url: u\n  repo: r\n  token: from-file\n",
        )
        .unwrap();
        assert_eq!(
            config.resolve_token(Some("from-env".to_string())).unwrap(),
            "from-file"
        );
    }

    #[test]
    fn test_missing_file_is_a_typed_error() {
        let error = TriageConfig::load(Path::new("/nonexistent/triage.yaml")).unwrap_err();
        assert!(matches!(error, ConfigError::Io { .. }));
    }
}
