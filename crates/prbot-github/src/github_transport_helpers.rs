use serde_json::Value;

pub const GITHUB_ERROR_BODY_MAX_CHARS: usize = 800;

pub fn truncate_for_error(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut truncated = text.chars().take(max_chars).collect::<String>();
    truncated.push_str("...");
    truncated
}

/// Extracts the `message` field GitHub places on error payloads.
pub fn github_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<Value>(body).ok()?;
    let message = parsed.get("message")?.as_str()?.trim();
    if message.is_empty() {
        return None;
    }
    Some(message.to_string())
}
