//! Comment gateway server bootstrap and router wiring.

use super::*;

/// Binds the configured address and serves the comment endpoint until ctrl-c.
pub async fn run_comment_gateway_server(config: CommentGatewayServerConfig) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid --bind '{}'", config.bind))?;

    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind comment gateway server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound comment gateway server address")?;

    tracing::info!(
        endpoint = ISSUE_COMMENTS_ENDPOINT,
        addr = %local_addr,
        api_base = %config.transport.api_base,
        "comment gateway server listening"
    );

    let state = Arc::new(CommentGatewayServerState::new(config));
    let app = build_comment_gateway_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("comment gateway server exited unexpectedly")?;

    tracing::info!("comment gateway server stopped");
    Ok(())
}

/// Builds the comment gateway router for embedding in another server.
pub fn build_comment_gateway_app(config: CommentGatewayServerConfig) -> Router {
    build_comment_gateway_router(Arc::new(CommentGatewayServerState::new(config)))
}

pub(super) fn build_comment_gateway_router(state: Arc<CommentGatewayServerState>) -> Router {
    Router::new()
        .route(ISSUE_COMMENTS_ENDPOINT, post(handle_issue_comment_upsert))
        .with_state(state)
}
