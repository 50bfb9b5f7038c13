//! Keep-alive duration resolution from response headers.
//!
//! # Responsibilities
//! - Extract connection-control directives from `Connection` headers
//! - Resolve how long a released connection may sit idle
//!
//! # Design Decisions
//! - Pure functions, no failure mode: malformed input degrades to the
//!   30-second default instead of erroring
//! - Plain linear scan with first-match semantics
//! - Only the `Connection` header is consulted; nothing else of the wire
//!   format matters to the pool

use std::time::Duration;

use hyper::header::CONNECTION;
use hyper::HeaderMap;

/// Fallback idle duration when the server advertises no usable hint.
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// Resolve the keep-alive duration from connection-control directives.
///
/// The first directive named `timeout` (case-insensitive) whose value is a
/// valid non-negative integer wins and is interpreted as seconds. `"0"` is a
/// valid match meaning "do not keep alive". Anything else falls back to
/// [`DEFAULT_KEEP_ALIVE`].
pub fn resolve(directives: &[(String, String)]) -> Duration {
    for (name, value) in directives {
        if name.eq_ignore_ascii_case("timeout") {
            if let Some(seconds) = parse_seconds(value) {
                return Duration::from_secs(seconds);
            }
        }
    }
    DEFAULT_KEEP_ALIVE
}

/// Extract `name[=value]` directives from every `Connection` header value,
/// in order. Values are comma-separated; a bare token yields an empty value.
pub fn connection_directives(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut directives = Vec::new();
    for header in headers.get_all(CONNECTION) {
        let Ok(text) = header.to_str() else { continue };
        for token in text.split(',') {
            let token = token.trim();
            if token.is_empty() {
                continue;
            }
            match token.split_once('=') {
                Some((name, value)) => directives.push((
                    name.trim().to_string(),
                    value.trim().trim_matches('"').to_string(),
                )),
                None => directives.push((token.to_string(), String::new())),
            }
        }
    }
    directives
}

fn parse_seconds(value: &str) -> Option<u64> {
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    value.parse().ok()
}
