use async_trait::async_trait;
use log::debug;
use pitwall_platform::Platform;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::VersionString;

const CHECK_UPDATE_PATH: &str = "app/check-update";
const BODY_SNIPPET_CHARS: usize = 160;

/// Result of one successful update query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateInfo {
    pub has_update: bool,
    pub current_version: VersionString,
    pub latest_version: VersionString,
    pub update_url: Option<String>,
    pub is_required: bool,
    pub release_notes: Option<String>,
}

impl UpdateInfo {
    /// Client-side ordering check, independent of the server's `hasUpdate`.
    #[must_use]
    pub fn is_newer_than_current(&self) -> bool {
        self.current_version.is_older_than(&self.latest_version)
    }
}

/// Build identifier supplied by the packaging layer, sent back verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildNumber {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for BuildNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text),
        }
    }
}

impl From<u64> for BuildNumber {
    fn from(value: u64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for BuildNumber {
    fn from(value: &str) -> Self {
        value
            .parse::<u64>()
            .map_or_else(|_| Self::Text(value.to_string()), Self::Number)
    }
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid update endpoint {url}: {details}")]
    InvalidEndpoint { url: String, details: String },
    #[error("failed to reach update endpoint: {0}")]
    Network(#[source] reqwest::Error),
    #[error("update check failed with HTTP {status}{body_snippet}")]
    Server {
        status: reqwest::StatusCode,
        body_snippet: String,
    },
    #[error("failed to parse update check response: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Anything able to answer "is there a newer build than this one?".
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn check_for_updates(
        &self,
        current: &VersionString,
        platform: Platform,
        build_number: &BuildNumber,
    ) -> Result<UpdateInfo, QueryError>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckUpdateRequest<'a> {
    current_version: &'a str,
    platform: Platform,
    build_number: &'a BuildNumber,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CheckUpdateResponse {
    #[serde(default)]
    has_update: Option<bool>,
    #[serde(default)]
    latest_version: Option<String>,
    #[serde(default)]
    update_url: Option<String>,
    #[serde(default)]
    is_required: Option<bool>,
    #[serde(default)]
    release_notes: Option<String>,
}

/// HTTP implementation of [`UpdateSource`] against the game backend.
///
/// Sends exactly one request per call. Retries and caching are left to the
/// caller; the request timeout is whatever the supplied client carries.
#[derive(Clone)]
pub struct UpdateClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
}

impl UpdateClient {
    /// Create a client posting to `<api_base>/app/check-update`.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidEndpoint`] when `api_base` does not form
    /// a valid absolute URL.
    pub fn new(http: reqwest::Client, api_base: &str) -> Result<Self, QueryError> {
        let url = format!("{}/{CHECK_UPDATE_PATH}", api_base.trim_end_matches('/'));
        let endpoint = reqwest::Url::parse(&url).map_err(|error| QueryError::InvalidEndpoint {
            url: url.clone(),
            details: error.to_string(),
        })?;
        Ok(Self { http, endpoint })
    }

    #[must_use]
    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

#[async_trait]
impl UpdateSource for UpdateClient {
    async fn check_for_updates(
        &self,
        current: &VersionString,
        platform: Platform,
        build_number: &BuildNumber,
    ) -> Result<UpdateInfo, QueryError> {
        let request = CheckUpdateRequest {
            current_version: current.as_str(),
            platform,
            build_number,
        };

        debug!(
            "Checking for updates: version={current} platform={platform} build={build_number}"
        );

        let response = self
            .http
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(QueryError::Network)?;

        let status = response.status();
        if !status.is_success() {
            let body_snippet = response
                .text()
                .await
                .ok()
                .map(|body| response_snippet(&body, BODY_SNIPPET_CHARS))
                .unwrap_or_default();
            return Err(QueryError::Server {
                status,
                body_snippet,
            });
        }

        let body = response.text().await.map_err(QueryError::Network)?;
        let parsed = parse_response(&body)?;

        Ok(update_info_from_response(parsed, current))
    }
}

fn parse_response(body: &str) -> Result<CheckUpdateResponse, QueryError> {
    let value: serde_json::Value = serde_json::from_str(body).map_err(QueryError::Parse)?;
    if !value.is_object() {
        return Err(QueryError::Parse(serde::de::Error::custom(
            "expected a JSON object",
        )));
    }
    serde_json::from_value(value).map_err(QueryError::Parse)
}

fn update_info_from_response(response: CheckUpdateResponse, current: &VersionString) -> UpdateInfo {
    let latest_version = non_empty(response.latest_version)
        .map_or_else(|| current.clone(), VersionString::new);

    UpdateInfo {
        has_update: response.has_update.unwrap_or(false),
        current_version: current.clone(),
        latest_version,
        update_url: non_empty(response.update_url),
        is_required: response.is_required.unwrap_or(false),
        release_notes: non_empty(response.release_notes),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

fn response_snippet(body: &str, max_chars: usize) -> String {
    let snippet: String = body.chars().take(max_chars).collect();
    if snippet.is_empty() {
        String::new()
    } else {
        format!(": {snippet}")
    }
}
