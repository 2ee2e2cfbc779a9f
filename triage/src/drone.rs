//! Build source interface and the Drone REST client.
//!
//! The scanner consumes builds and logs through [`BuildSource`] so tests and
//! alternative servers can inject their own implementation. [`DroneClient`]
//! is the production implementation against the Drone 1.x REST API.

use std::time::Duration;

use serde::de::DeserializeOwned;

use drone_triage_core::{Build, BuildSummary, LogLine};

/// Typed error for build/log fetches.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Network-level failure or undecodable body.
    #[error("request to {path} failed: {source}")]
    Http {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    /// The server answered outside the 2xx range.
    #[error("unexpected HTTP status {status} for {path}")]
    Status { status: u16, path: String },

    /// The HTTP client itself could not be constructed.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Read-only access to builds and step logs on a CI server.
pub trait BuildSource: Sync {
    /// Lists builds for the configured repository, most recent first.
    fn list_builds(&self) -> Result<Vec<BuildSummary>, ApiError>;

    /// Fetches one build with its full stage/step tree.
    fn build(&self, number: u64) -> Result<Build, ApiError>;

    /// Fetches the log lines of one step.
    fn step_log(&self, build: u64, stage: i64, step: i64) -> Result<Vec<LogLine>, ApiError>;

    /// Human-facing URL pointing at the step, for telemetry payloads.
    fn diagnostic_url(&self, build: u64, stage: i64, step: i64) -> String;
}

/// Drone 1.x REST client with bearer-token auth and a per-call timeout.
pub struct DroneClient {
    http: reqwest::blocking::Client,
    base_url: String,
    repo: String,
    token: String,
}

impl DroneClient {
    pub fn new(
        base_url: &str,
        repo: &str,
        token: &str,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ApiError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            repo: repo.to_string(),
            token: token.to_string(),
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .map_err(|source| ApiError::Http {
                path: path.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        response.json().map_err(|source| ApiError::Http {
            path: path.to_string(),
            source,
        })
    }
}

impl BuildSource for DroneClient {
    fn list_builds(&self) -> Result<Vec<BuildSummary>, ApiError> {
        self.get_json(&format!("/api/repos/{}/builds", self.repo))
    }

    fn build(&self, number: u64) -> Result<Build, ApiError> {
        self.get_json(&format!("/api/repos/{}/builds/{number}", self.repo))
    }

    fn step_log(&self, build: u64, stage: i64, step: i64) -> Result<Vec<LogLine>, ApiError> {
        self.get_json(&format!(
            "/api/repos/{}/builds/{build}/logs/{stage}/{step}",
            self.repo
        ))
    }

    fn diagnostic_url(&self, build: u64, stage: i64, step: i64) -> String {
        format!("{}/{}/{build}/{stage}/{step}", self.base_url, self.repo)
    }
}
