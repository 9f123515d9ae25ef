//! Shared blocking HTTP client construction for the production capabilities.

use std::time::Duration;

use anyhow::Context as _;

use crate::foundation::error::PosterResult;

/// Build a blocking client with the engine's user agent and request timeout.
///
/// Each capability owns one client and reuses it for every request it makes.
pub(crate) fn build_client(
    user_agent: &str,
    timeout: Duration,
) -> PosterResult<reqwest::blocking::Client> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(user_agent)
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(30)))
        .build()
        .context("build HTTP client")?;
    Ok(client)
}

/// Trim trailing slashes so `{base}/path` never doubles them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Shorten an upstream body for error messages.
pub(crate) fn snippet(body: &str) -> String {
    const MAX: usize = 200;
    let body = body.trim();
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
