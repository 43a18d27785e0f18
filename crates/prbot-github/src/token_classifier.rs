//! Heuristic detection of constrained (integration-scoped) GitHub tokens.
//!
//! A temporary Actions token cannot list the caller's repositories: GitHub
//! answers `403 Resource not accessible by integration`. A personal token lists
//! them with `200` and a bad token gets `401`. The check is far from perfect and
//! is kept behind [`TokenClassifier`] so it can be replaced.

use async_trait::async_trait;

use crate::github_api_client::{GithubApiClient, GithubApiError, GithubTransportConfig};

pub const INTEGRATION_TOKEN_MESSAGE_PREFIX: &str = "Resource not accessible by integration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenVerdict {
    Accepted(&'static str),
    Rejected(&'static str),
}

impl TokenVerdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Accepted(reason) | Self::Rejected(reason) => reason,
        }
    }
}

#[async_trait]
/// Capability deciding whether a caller-supplied token may authorize a write.
pub trait TokenClassifier: Send + Sync {
    async fn classify(&self, candidate: Option<&str>) -> TokenVerdict;
}

/// Maps the outcome of the repository-listing probe to a verdict.
pub fn classify_probe_outcome(outcome: &Result<(), GithubApiError>) -> TokenVerdict {
    match outcome {
        Ok(()) => TokenVerdict::Rejected("broad_scope_token"),
        Err(error)
            if error.status() == Some(403)
                && error
                    .github_message()
                    .is_some_and(|message| message.starts_with(INTEGRATION_TOKEN_MESSAGE_PREFIX)) =>
        {
            TokenVerdict::Accepted("integration_token")
        }
        Err(_) => TokenVerdict::Rejected("probe_failed"),
    }
}

#[derive(Debug, Clone)]
/// Classifier probing `GET /user/repos` with the candidate token.
pub struct GithubProbeTokenClassifier {
    transport: GithubTransportConfig,
    service_token: String,
}

impl GithubProbeTokenClassifier {
    pub fn new(transport: GithubTransportConfig, service_token: impl Into<String>) -> Self {
        Self {
            transport,
            service_token: service_token.into(),
        }
    }
}

#[async_trait]
impl TokenClassifier for GithubProbeTokenClassifier {
    async fn classify(&self, candidate: Option<&str>) -> TokenVerdict {
        let Some(candidate) = candidate.map(str::trim).filter(|value| !value.is_empty()) else {
            return TokenVerdict::Rejected("missing_token");
        };
        if candidate == self.service_token.trim() {
            // Assume the use of the service token is intentional.
            return TokenVerdict::Accepted("service_token");
        }

        let outcome = match GithubApiClient::new(&self.transport, candidate) {
            Ok(client) => client.probe_viewer_repositories().await,
            Err(error) => Err(error),
        };
        if let Err(error) = &outcome {
            tracing::debug!(error = %error, "temporary token probe failed");
        }
        classify_probe_outcome(&outcome)
    }
}
