use std::net::SocketAddr;
use std::time::Duration;

use httpmock::prelude::*;
use prbot_gateway::{build_comment_gateway_app, CommentGatewayServerConfig, TEMPORARY_TOKEN_HEADER};
use prbot_github::{GithubTransportConfig, STATUS_COMMENT_MARKER};
use serde_json::{json, Value};

const SERVICE_TOKEN: &str = "service-token";
const TEMPORARY_TOKEN: &str = "ghs_temporary";

async fn spawn_gateway(github: &MockServer) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let config = CommentGatewayServerConfig::new(
        "127.0.0.1:0",
        GithubTransportConfig {
            api_base: github.base_url(),
            request_timeout_ms: 2_000,
            ..GithubTransportConfig::default()
        },
        SERVICE_TOKEN,
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral listener");
    let addr = listener.local_addr().expect("resolve listener addr");
    let app = build_comment_gateway_app(config);
    let handle = tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    (addr, handle)
}

async fn post_status(addr: SocketAddr, payload: Value) -> (u16, Value) {
    let response = reqwest::Client::new()
        .post(format!("http://{addr}/repos/acme/widgets/issues/42/comments"))
        .header(TEMPORARY_TOKEN_HEADER, TEMPORARY_TOKEN)
        .json(&payload)
        .send()
        .await
        .expect("send status request");
    let status = response.status().as_u16();
    let body = response.json::<Value>().await.expect("decode response");
    (status, body)
}

fn listing_mock(github: &MockServer, comments: Value) -> httpmock::Mock<'_> {
    github.mock(|when, then| {
        when.method(GET)
            .path("/repos/acme/widgets/issues/42/comments")
            .header("authorization", format!("token {SERVICE_TOKEN}").as_str())
            .header("accept", "application/vnd.github.v3+json");
        then.status(200).json_body(comments);
    })
}

#[tokio::test]
async fn integration_status_comment_lifecycle_create_update_replace_delete() {
    let github = MockServer::start();
    let probe = github.mock(|when, then| {
        when.method(GET)
            .path("/user/repos")
            .header("authorization", format!("token {TEMPORARY_TOKEN}").as_str());
        then.status(403)
            .json_body(json!({"message": "Resource not accessible by integration"}));
    });
    let (addr, handle) = spawn_gateway(&github).await;
    let first_body = format!("Build #1 passed\n{STATUS_COMMENT_MARKER}");
    let second_body = format!("Build #2 failed\n{STATUS_COMMENT_MARKER}");
    let third_body = format!("Build #3 passed\n{STATUS_COMMENT_MARKER}");

    // Upsert on an empty thread creates the status comment.
    let mut listing = listing_mock(&github, json!([{"id": 1, "body": "LGTM"}]));
    let mut create = github.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/42/comments")
            .json_body(json!({"body": first_body}));
        then.status(201)
            .json_body(json!({"id": 100, "body": first_body}));
    });
    let (status, body) = post_status(addr, json!({"body": "Build #1 passed"})).await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], 100);
    create.assert_calls(1);
    listing.delete();
    create.delete();

    // A second upsert patches the comment created above.
    let mut listing = listing_mock(
        &github,
        json!([{"id": 1, "body": "LGTM"}, {"id": 100, "body": first_body}]),
    );
    let mut patch = github.mock(|when, then| {
        when.method(PATCH)
            .path("/repos/acme/widgets/issues/comments/100")
            .json_body(json!({"body": second_body}));
        then.status(200)
            .json_body(json!({"id": 100, "body": second_body}));
    });
    let (status, body) = post_status(addr, json!({"body": second_body})).await;
    assert_eq!(status, 200);
    assert_eq!(body["body"], second_body.as_str());
    patch.assert_calls(1);
    listing.delete();
    patch.delete();

    // Replace drops the old comment and posts a fresh one.
    let mut listing = listing_mock(&github, json!([{"id": 100, "body": second_body}]));
    let mut delete_old = github.mock(|when, then| {
        when.method(DELETE)
            .path("/repos/acme/widgets/issues/comments/100");
        then.status(204);
    });
    let mut create = github.mock(|when, then| {
        when.method(POST)
            .path("/repos/acme/widgets/issues/42/comments")
            .json_body(json!({"body": third_body}));
        then.status(201)
            .json_body(json!({"id": 101, "body": third_body}));
    });
    let (status, body) = post_status(
        addr,
        json!({"body": "Build #3 passed", "mode": "replace"}),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["id"], 101);
    delete_old.assert_calls(1);
    create.assert_calls(1);
    listing.delete();
    delete_old.delete();
    create.delete();

    // The delete sentinel clears it and answers with an empty object.
    listing_mock(&github, json!([{"id": 101, "body": third_body}]));
    let delete_new = github.mock(|when, then| {
        when.method(DELETE)
            .path("/repos/acme/widgets/issues/comments/101");
        then.status(204);
    });
    let (status, body) = post_status(addr, json!({"body": "delete"})).await;
    assert_eq!(status, 200);
    assert_eq!(body, json!({}));
    delete_new.assert_calls(1);

    probe.assert_calls(4);
    handle.abort();
}
