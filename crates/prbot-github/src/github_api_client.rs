use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::github_transport_helpers::{
    github_error_message, truncate_for_error, GITHUB_ERROR_BODY_MAX_CHARS,
};

pub const DEFAULT_GITHUB_API_BASE: &str = "https://api.github.com";
pub const GITHUB_V3_ACCEPT: &str = "application/vnd.github.v3+json";
pub const DEFAULT_GITHUB_USER_AGENT: &str = "http-client-add-pr-comment-bot";
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Failure raised by a single GitHub REST call.
#[derive(Debug, Error)]
pub enum GithubApiError {
    #[error("invalid github client configuration: {0}")]
    Configuration(String),
    #[error("github api {operation} request failed: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("github api {operation} failed with status {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        message: Option<String>,
        body: String,
    },
    #[error("failed to decode github {operation}: {source}")]
    Decode {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

impl GithubApiError {
    /// Upstream HTTP status for non-success responses.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The `message` field GitHub attached to a non-success response, if any.
    pub fn github_message(&self) -> Option<&str> {
        match self {
            Self::Status { message, .. } => message.as_deref(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Connection settings shared by every client built for a request.
pub struct GithubTransportConfig {
    pub api_base: String,
    pub user_agent: String,
    pub request_timeout_ms: u64,
}

impl Default for GithubTransportConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API_BASE.to_string(),
            user_agent: DEFAULT_GITHUB_USER_AGENT.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Issue or pull-request thread addressed by owner, repository and number.
pub struct IssueThreadRef {
    pub owner: String,
    pub repo: String,
    pub issue_number: u64,
}

fn validate_path_segment(label: &str, raw: &str) -> Result<String, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(format!("{label} must not be empty"));
    }
    if matches!(value, "." | "..") {
        return Err(format!("{label} must not be a relative path segment"));
    }
    if value
        .chars()
        .any(|ch| matches!(ch, '/' | '?' | '#' | '%') || ch.is_whitespace())
    {
        return Err(format!("{label} '{value}' contains unsupported characters"));
    }
    Ok(value.to_string())
}

impl IssueThreadRef {
    pub fn new(owner: &str, repo: &str, issue_number: u64) -> Result<Self, String> {
        Ok(Self {
            owner: validate_path_segment("owner", owner)?,
            repo: validate_path_segment("repo", repo)?,
            issue_number,
        })
    }

    fn comments_path(&self) -> String {
        format!(
            "/repos/{}/{}/issues/{}/comments",
            self.owner, self.repo, self.issue_number
        )
    }

    fn comment_path(&self, comment_id: u64) -> String {
        format!(
            "/repos/{}/{}/issues/comments/{}",
            self.owner, self.repo, comment_id
        )
    }
}

impl std::fmt::Display for IssueThreadRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.issue_number)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct GithubIssueComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
}

/// GitHub REST client bound to exactly one credential.
///
/// A fresh client is built per inbound request; the credential is baked into
/// the default headers so callers never pass tokens around per call.
#[derive(Clone)]
pub struct GithubApiClient {
    http: reqwest::Client,
    api_base: String,
}

impl std::fmt::Debug for GithubApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubApiClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl GithubApiClient {
    pub fn new(transport: &GithubTransportConfig, token: &str) -> Result<Self, GithubApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(transport.user_agent.trim()).map_err(|_| {
                GithubApiError::Configuration("invalid github user agent".to_string())
            })?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_V3_ACCEPT));
        let mut auth_header = HeaderValue::from_str(&format!("token {}", token.trim()))
            .map_err(|_| {
                GithubApiError::Configuration("invalid github authorization header".to_string())
            })?;
        auth_header.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth_header);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_millis(transport.request_timeout_ms.max(1)))
            .build()
            .map_err(|error| {
                GithubApiError::Configuration(format!("failed to create github api client: {error}"))
            })?;
        Ok(Self {
            http,
            api_base: transport.api_base.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Fetches the first page of comments on the thread, oldest first.
    pub async fn list_issue_comments(
        &self,
        thread: &IssueThreadRef,
    ) -> Result<Vec<GithubIssueComment>, GithubApiError> {
        let request = self
            .http
            .get(self.url(&thread.comments_path()))
            .query(&[("per_page", "100")]);
        self.request_json("list issue comments", request).await
    }

    pub async fn create_issue_comment(
        &self,
        thread: &IssueThreadRef,
        body: &str,
    ) -> Result<Value, GithubApiError> {
        let request = self
            .http
            .post(self.url(&thread.comments_path()))
            .json(&json!({ "body": body }));
        self.request_json("create issue comment", request).await
    }

    pub async fn update_issue_comment(
        &self,
        thread: &IssueThreadRef,
        comment_id: u64,
        body: &str,
    ) -> Result<Value, GithubApiError> {
        let request = self
            .http
            .patch(self.url(&thread.comment_path(comment_id)))
            .json(&json!({ "body": body }));
        self.request_json("update issue comment", request).await
    }

    pub async fn delete_issue_comment(
        &self,
        thread: &IssueThreadRef,
        comment_id: u64,
    ) -> Result<(), GithubApiError> {
        let request = self.http.delete(self.url(&thread.comment_path(comment_id)));
        self.send("delete issue comment", request).await?;
        Ok(())
    }

    /// Calls `GET /user/repos`, which needs account-wide read access.
    ///
    /// The response body is discarded; only success or the failure shape matters.
    pub async fn probe_viewer_repositories(&self) -> Result<(), GithubApiError> {
        let request = self.http.get(self.url("/user/repos"));
        self.send("list viewer repositories", request).await?;
        Ok(())
    }

    async fn send(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GithubApiError> {
        let response = request
            .send()
            .await
            .map_err(|source| GithubApiError::Transport { operation, source })?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(GithubApiError::Status {
            operation,
            status: status.as_u16(),
            message: github_error_message(&body),
            body: truncate_for_error(&body, GITHUB_ERROR_BODY_MAX_CHARS),
        })
    }

    async fn request_json<T>(
        &self,
        operation: &'static str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, GithubApiError>
    where
        T: DeserializeOwned,
    {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|source| GithubApiError::Decode { operation, source })
    }
}
