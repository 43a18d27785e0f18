use crate::github_api_client::{
    GithubApiClient, GithubApiError, GithubIssueComment, IssueThreadRef,
};

/// Hidden HTML comment identifying status comments owned by this service.
pub const STATUS_COMMENT_MARKER: &str = "<!--- Danger-PHP-Marker -->";

pub fn is_marked_comment_body(body: &str) -> bool {
    body.contains(STATUS_COMMENT_MARKER)
}

/// Ids of marked comments, preserving upstream order.
pub fn marked_comment_ids(comments: &[GithubIssueComment]) -> Vec<u64> {
    comments
        .iter()
        .filter(|comment| comment.body.as_deref().is_some_and(is_marked_comment_body))
        .map(|comment| comment.id)
        .collect()
}

/// Returns `body` with the marker appended on its own line when absent.
pub fn ensure_status_comment_marker(body: &str) -> String {
    if is_marked_comment_body(body) {
        return body.to_string();
    }
    if body.is_empty() {
        return STATUS_COMMENT_MARKER.to_string();
    }
    format!("{body}\n{STATUS_COMMENT_MARKER}")
}

pub async fn list_marked_comment_ids(
    client: &GithubApiClient,
    thread: &IssueThreadRef,
) -> Result<Vec<u64>, GithubApiError> {
    let comments = client.list_issue_comments(thread).await?;
    Ok(marked_comment_ids(&comments))
}
