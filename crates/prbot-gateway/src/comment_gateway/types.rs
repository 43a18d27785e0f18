use super::*;

#[derive(Debug)]
pub(super) struct CommentGatewayApiError {
    pub(super) status: StatusCode,
    pub(super) code: &'static str,
    pub(super) message: String,
}

impl CommentGatewayApiError {
    pub(super) fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub(super) fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub(super) fn bad_gateway(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, code, message)
    }

    pub(super) fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    fn payload(&self) -> Value {
        let error_type = if self.status.is_client_error() {
            "invalid_request_error"
        } else {
            "server_error"
        };
        json!({
            "error": {
                "type": error_type,
                "code": self.code,
                "message": self.message,
            }
        })
    }
}

impl From<GithubApiError> for CommentGatewayApiError {
    fn from(error: GithubApiError) -> Self {
        match &error {
            GithubApiError::Configuration(_) => Self::internal(error.to_string()),
            GithubApiError::Status { status, .. } if (400..500).contains(status) => {
                let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY);
                Self::new(status, "github_api_rejected", error.to_string())
            }
            _ => Self::bad_gateway("github_api_unavailable", error.to_string()),
        }
    }
}

impl IntoResponse for CommentGatewayApiError {
    fn into_response(self) -> Response {
        let payload = self.payload();
        tracing::warn!(status = self.status.as_u16(), error = %payload, "comment gateway request failed");
        (self.status, Json(payload)).into_response()
    }
}

/// Request body accepted by the issue comment endpoint.
#[derive(Debug, Deserialize)]
pub(super) struct IssueCommentUpsertRequest {
    pub(super) body: String,
    #[serde(default)]
    pub(super) mode: Option<String>,
}
