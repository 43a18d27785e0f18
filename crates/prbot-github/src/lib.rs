//! GitHub REST primitives for the prbot status-comment gateway.
//! This crate provides the per-credential API client, the status-comment marker
//! locator, and the temporary-token classifier consumed by the gateway.

pub mod comment_marker;
pub mod github_api_client;
pub mod github_transport_helpers;
pub mod token_classifier;

pub use comment_marker::*;
pub use github_api_client::*;
pub use token_classifier::*;
