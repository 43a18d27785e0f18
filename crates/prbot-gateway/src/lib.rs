//! HTTP gateway that lets CI jobs manage a single status comment per thread.
pub mod comment_gateway;

pub use comment_gateway::*;
