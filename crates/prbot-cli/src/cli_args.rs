use clap::Parser;
use prbot_gateway::CommentGatewayServerConfig;
use prbot_github::{
    GithubTransportConfig, DEFAULT_GITHUB_API_BASE, DEFAULT_GITHUB_USER_AGENT,
    DEFAULT_REQUEST_TIMEOUT_MS,
};

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_non_empty_token(value: &str) -> Result<String, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("token must not be empty".to_string());
    }
    Ok(trimmed.to_string())
}

#[derive(Parser)]
#[command(
    name = "prbot",
    about = "Gateway that lets CI jobs manage a single status comment on a GitHub thread",
    version
)]
pub(crate) struct Cli {
    #[arg(
        long,
        env = "PRBOT_BIND",
        default_value = "0.0.0.0:3000",
        help = "Socket address the comment gateway listens on"
    )]
    pub(crate) bind: String,

    #[arg(
        long = "github-token",
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        value_parser = parse_non_empty_token,
        help = "Long-lived service token used for every comment read and write"
    )]
    pub(crate) github_token: String,

    #[arg(
        long = "github-api-base",
        env = "GITHUB_API_URL",
        default_value = DEFAULT_GITHUB_API_BASE,
        help = "Base URL of the GitHub REST API"
    )]
    pub(crate) github_api_base: String,

    #[arg(
        long = "request-timeout-ms",
        env = "PRBOT_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        value_parser = parse_positive_u64,
        help = "Timeout applied to each GitHub API call"
    )]
    pub(crate) request_timeout_ms: u64,
}

impl std::fmt::Debug for Cli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cli")
            .field("bind", &self.bind)
            .field("github_token", &"<redacted>")
            .field("github_api_base", &self.github_api_base)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

impl Cli {
    pub(crate) fn server_config(&self) -> CommentGatewayServerConfig {
        CommentGatewayServerConfig::new(
            self.bind.clone(),
            GithubTransportConfig {
                api_base: self.github_api_base.trim().to_string(),
                user_agent: DEFAULT_GITHUB_USER_AGENT.to_string(),
                request_timeout_ms: self.request_timeout_ms,
            },
            self.github_token.clone(),
        )
    }
}
