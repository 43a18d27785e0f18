//! Ordered write steps applied to a thread's status comment.
use super::*;

/// Body value that requests deletion of the status comment.
pub const DELETE_BODY_SENTINEL: &str = "delete";
pub const REPLACE_MODE: &str = "replace";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentAction {
    Delete,
    Replace { body: String },
    Upsert { body: String },
}

impl CommentAction {
    pub fn from_request(body: &str, mode: Option<&str>) -> Self {
        if body == DELETE_BODY_SENTINEL {
            return Self::Delete;
        }
        if mode == Some(REPLACE_MODE) {
            return Self::Replace {
                body: body.to_string(),
            };
        }
        Self::Upsert {
            body: body.to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Replace { .. } => "replace",
            Self::Upsert { .. } => "upsert",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentStep {
    Delete { comment_id: u64 },
    Create { body: String },
    Patch { comment_id: u64, body: String },
}

/// Plans the writes for `action` given the marked ids in upstream order.
///
/// Delete and replace clear every marked comment. Upsert only ever touches the
/// first marked id; later duplicates are left as they are.
pub fn plan_comment_steps(action: &CommentAction, marked_ids: &[u64]) -> Vec<CommentStep> {
    let deletes = marked_ids
        .iter()
        .map(|comment_id| CommentStep::Delete {
            comment_id: *comment_id,
        });
    match action {
        CommentAction::Delete => deletes.collect(),
        CommentAction::Replace { body } => deletes
            .chain(std::iter::once(CommentStep::Create {
                body: ensure_status_comment_marker(body),
            }))
            .collect(),
        CommentAction::Upsert { body } => {
            let body = ensure_status_comment_marker(body);
            match marked_ids.first() {
                Some(comment_id) => vec![CommentStep::Patch {
                    comment_id: *comment_id,
                    body,
                }],
                None => vec![CommentStep::Create { body }],
            }
        }
    }
}

/// Runs `steps` in order and stops at the first failure.
///
/// Returns the comment produced by the last create/patch, or `{}` when the
/// plan only deletes. Completed steps are not rolled back.
pub(super) async fn execute_comment_steps(
    client: &GithubApiClient,
    thread: &IssueThreadRef,
    steps: &[CommentStep],
) -> Result<Value, GithubApiError> {
    let mut response = json!({});
    for step in steps {
        match step {
            CommentStep::Delete { comment_id } => {
                client.delete_issue_comment(thread, *comment_id).await?;
                tracing::debug!(thread = %thread, comment_id, "deleted status comment");
            }
            CommentStep::Create { body } => {
                response = client.create_issue_comment(thread, body).await?;
                tracing::debug!(thread = %thread, "created status comment");
            }
            CommentStep::Patch { comment_id, body } => {
                response = client.update_issue_comment(thread, *comment_id, body).await?;
                tracing::debug!(thread = %thread, comment_id, "patched status comment");
            }
        }
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use prbot_github::STATUS_COMMENT_MARKER;

    fn marked(body: &str) -> String {
        format!("{body}\n{STATUS_COMMENT_MARKER}")
    }

    #[test]
    fn unit_comment_action_from_request_prioritizes_delete_sentinel() {
        assert_eq!(
            CommentAction::from_request("delete", Some("replace")),
            CommentAction::Delete
        );
        assert_eq!(
            CommentAction::from_request("report", Some("replace")),
            CommentAction::Replace {
                body: "report".to_string()
            }
        );
        assert_eq!(
            CommentAction::from_request("report", None),
            CommentAction::Upsert {
                body: "report".to_string()
            }
        );
    }

    #[test]
    fn regression_unknown_mode_and_near_sentinels_fall_back_to_upsert() {
        assert_eq!(
            CommentAction::from_request("report", Some("append")).as_str(),
            "upsert"
        );
        assert_eq!(
            CommentAction::from_request("Delete", None).as_str(),
            "upsert"
        );
        assert_eq!(
            CommentAction::from_request(" delete", None).as_str(),
            "upsert"
        );
        assert_eq!(
            CommentAction::from_request("report", Some("REPLACE")).as_str(),
            "upsert"
        );
    }

    #[test]
    fn unit_plan_delete_removes_every_marked_id_in_order() {
        assert_eq!(
            plan_comment_steps(&CommentAction::Delete, &[30, 10, 20]),
            vec![
                CommentStep::Delete { comment_id: 30 },
                CommentStep::Delete { comment_id: 10 },
                CommentStep::Delete { comment_id: 20 },
            ]
        );
        assert!(plan_comment_steps(&CommentAction::Delete, &[]).is_empty());
    }

    #[test]
    fn unit_plan_replace_deletes_before_single_create() {
        let action = CommentAction::Replace {
            body: "new report".to_string(),
        };
        assert_eq!(
            plan_comment_steps(&action, &[4, 5]),
            vec![
                CommentStep::Delete { comment_id: 4 },
                CommentStep::Delete { comment_id: 5 },
                CommentStep::Create {
                    body: marked("new report")
                },
            ]
        );
        assert_eq!(
            plan_comment_steps(&action, &[]),
            vec![CommentStep::Create {
                body: marked("new report")
            }]
        );
    }

    #[test]
    fn unit_plan_upsert_patches_first_marked_id_only() {
        let action = CommentAction::Upsert {
            body: "report".to_string(),
        };
        assert_eq!(
            plan_comment_steps(&action, &[8, 9, 10]),
            vec![CommentStep::Patch {
                comment_id: 8,
                body: marked("report")
            }]
        );
        assert_eq!(
            plan_comment_steps(&action, &[]),
            vec![CommentStep::Create {
                body: marked("report")
            }]
        );
    }

    #[test]
    fn regression_plan_keeps_caller_supplied_marker_untouched() {
        let body = format!("{STATUS_COMMENT_MARKER}\n## Danger report");
        let action = CommentAction::Upsert { body: body.clone() };
        assert_eq!(
            plan_comment_steps(&action, &[]),
            vec![CommentStep::Create { body }]
        );
    }
}
