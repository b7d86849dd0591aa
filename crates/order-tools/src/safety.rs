//! Redaction and size limits for upstream traffic.
//!
//! Upstream credentials may travel in the query string (`consumer_key`/`consumer_secret`), so
//! anything derived from a request URL must be scrubbed before it reaches a log line or a
//! client-visible error.

use url::Url;

/// Default cap on upstream response bodies.
pub const DEFAULT_MAX_RESPONSE_BYTES: usize = 2 * 1024 * 1024;

/// Maximum number of characters of an upstream error body kept for diagnostics.
pub const MAX_DIAGNOSTIC_CHARS: usize = 512;

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

/// Truncate a diagnostic body to [`MAX_DIAGNOSTIC_CHARS`] characters (char-boundary safe).
#[must_use]
pub fn truncate_diagnostic(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(MAX_DIAGNOSTIC_CHARS) {
        Some((idx, _)) => format!("{}…", &body[..idx]),
        None => body.to_string(),
    }
}
