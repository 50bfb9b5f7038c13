//! Fully-collected response representation.

use bytes::Bytes;
use hyper::{HeaderMap, StatusCode};

/// A complete response: status, headers, and the collected body.
///
/// The executor always drains the body before handing the response back, so
/// the connection is reusable by the time the caller sees this.
#[derive(Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Body as UTF-8, if it is valid UTF-8.
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }
}
