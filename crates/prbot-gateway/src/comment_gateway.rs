use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use prbot_github::{
    ensure_status_comment_marker, list_marked_comment_ids, GithubApiClient, GithubApiError,
    GithubProbeTokenClassifier, GithubTransportConfig, IssueThreadRef, TokenClassifier,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::net::TcpListener;

mod comment_pipeline;
mod server_bootstrap;
mod types;

pub use comment_pipeline::{
    plan_comment_steps, CommentAction, CommentStep, DELETE_BODY_SENTINEL, REPLACE_MODE,
};
pub use server_bootstrap::{build_comment_gateway_app, run_comment_gateway_server};

use comment_pipeline::execute_comment_steps;
use types::{CommentGatewayApiError, IssueCommentUpsertRequest};

const ISSUE_COMMENTS_ENDPOINT: &str = "/repos/{owner}/{repo}/issues/{issue_number}/comments";
pub const TEMPORARY_TOKEN_HEADER: &str = "temporary-github-token";
const INVALID_TEMPORARY_TOKEN_MESSAGE: &str = "must provide a valid temporary github token";

#[derive(Clone)]
/// Immutable configuration injected into the comment gateway at startup.
pub struct CommentGatewayServerConfig {
    pub bind: String,
    pub transport: GithubTransportConfig,
    pub service_token: String,
    pub token_classifier: Arc<dyn TokenClassifier>,
}

impl CommentGatewayServerConfig {
    /// Builds a config that classifies temporary tokens by probing GitHub.
    pub fn new(
        bind: impl Into<String>,
        transport: GithubTransportConfig,
        service_token: impl Into<String>,
    ) -> Self {
        let service_token = service_token.into();
        let token_classifier = Arc::new(GithubProbeTokenClassifier::new(
            transport.clone(),
            service_token.clone(),
        ));
        Self {
            bind: bind.into(),
            transport,
            service_token,
            token_classifier,
        }
    }
}

impl std::fmt::Debug for CommentGatewayServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentGatewayServerConfig")
            .field("bind", &self.bind)
            .field("transport", &self.transport)
            .field("service_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct CommentGatewayServerState {
    config: CommentGatewayServerConfig,
}

impl CommentGatewayServerState {
    fn new(config: CommentGatewayServerConfig) -> Self {
        Self { config }
    }
}

fn temporary_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(TEMPORARY_TOKEN_HEADER)?.to_str().ok()?;
    let token = raw.trim();
    if token.is_empty() {
        return None;
    }
    Some(token.to_string())
}

async fn handle_issue_comment_upsert(
    State(state): State<Arc<CommentGatewayServerState>>,
    path: Result<Path<(String, String, u64)>, PathRejection>,
    headers: HeaderMap,
    payload: Result<Json<IssueCommentUpsertRequest>, JsonRejection>,
) -> Result<Json<Value>, CommentGatewayApiError> {
    let temporary_token = temporary_token_from_headers(&headers);
    let verdict = state
        .config
        .token_classifier
        .classify(temporary_token.as_deref())
        .await;
    if !verdict.is_accepted() {
        tracing::info!(
            reason = verdict.reason_code(),
            "rejected temporary github token"
        );
        return Err(CommentGatewayApiError::bad_request(
            "invalid_temporary_token",
            INVALID_TEMPORARY_TOKEN_MESSAGE,
        ));
    }

    let Path((owner, repo, issue_number)) = path.map_err(|rejection| {
        CommentGatewayApiError::bad_request("invalid_issue_thread", rejection.body_text())
    })?;
    let Json(request) = payload.map_err(|rejection| {
        CommentGatewayApiError::bad_request("invalid_request_body", rejection.body_text())
    })?;
    let thread = IssueThreadRef::new(&owner, &repo, issue_number)
        .map_err(|message| CommentGatewayApiError::bad_request("invalid_issue_thread", message))?;
    let action = CommentAction::from_request(&request.body, request.mode.as_deref());

    let client = GithubApiClient::new(&state.config.transport, &state.config.service_token)?;
    let marked_ids = list_marked_comment_ids(&client, &thread).await?;
    let steps = plan_comment_steps(&action, &marked_ids);
    tracing::info!(
        thread = %thread,
        action = action.as_str(),
        token_verdict = verdict.reason_code(),
        marked_comments = marked_ids.len(),
        steps = steps.len(),
        "applying status comment action"
    );

    let response = execute_comment_steps(&client, &thread, &steps).await?;
    Ok(Json(response))
}
