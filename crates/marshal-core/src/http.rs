//! Shared HTTP plumbing for the GitHub and validation backend clients.

use std::time::Duration;

use crate::error::{MarshalError, Result};

/// User agent sent on every request. GitHub rejects requests without one.
pub const USER_AGENT: &str = concat!("marshal/", env!("CARGO_PKG_VERSION"));

/// Per-request timeout. The retry loops bound the run as a whole.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum length for response bodies quoted in error messages
const MAX_ERROR_BODY_LEN: usize = 500;

/// Build the reqwest client used by every Marshal client.
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| MarshalError::Configuration(format!("failed to create HTTP client: {e}")))
}

/// Trim an error body so a large HTML error page does not flood the log.
pub fn truncate_body(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_ERROR_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated)", &body[..end])
}

/// Strip trailing slashes so paths can be appended with `/`.
pub fn trim_base(url: &str) -> &str {
    url.trim_end_matches('/')
}
