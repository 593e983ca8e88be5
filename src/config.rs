//! API endpoint configuration.
//!
//! The client only needs the API origin to build request URLs. An empty
//! origin means same-origin requests (dev proxy or co-hosted deploys); a
//! non-empty origin points at a remote API host.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::fmt::Write as _;

/// Where the HippoBox API lives.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ApiConfig {
    origin: String,
}

impl ApiConfig {
    /// Configure a remote API origin, e.g. `https://api.example.com`.
    /// Trailing slashes are trimmed so path joins stay unambiguous.
    pub fn new(origin: impl Into<String>) -> Self {
        let origin = origin.into();
        Self {
            origin: origin.trim_end_matches('/').to_owned(),
        }
    }

    /// Same-origin configuration: request URLs are bare absolute paths.
    pub fn same_origin() -> Self {
        Self::default()
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Build a full request URL for an absolute route path.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{path}", self.origin)
        } else {
            format!("{}/{path}", self.origin)
        }
    }

    /// Build a request URL with query parameters. Empty values are kept,
    /// absent parameters are the caller's concern.
    pub fn url_with_query(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = self.url_for(path);
        for (i, (key, value)) in query.iter().enumerate() {
            let sep = if i == 0 { '?' } else { '&' };
            let _ = write!(url, "{sep}{key}={}", encode_component(value));
        }
        url
    }
}

/// Percent-encode a query or path component. Covers the characters that
/// would change URL structure; everything else passes through.
pub(crate) fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push_str("%20"),
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}
