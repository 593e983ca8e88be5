//! HTTP request/response model and the transport seam.
//!
//! DESIGN
//! ======
//! The pipeline in `net::client` works against the `Transport` trait rather
//! than a concrete fetch call so the retry/refresh logic is testable off
//! the browser. `FetchTransport` is the real browser implementation over
//! `gloo-net`.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use futures::future::LocalBoxFuture;
use serde::de::DeserializeOwned;

use crate::net::ApiError;

/// HTTP methods used by the HippoBox API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

/// An outbound API request.
///
/// `route` is the static route template the request was built from (e.g.
/// `/api/v1/auth/verify-email/{token}`), kept separate from the resolved
/// `url` so the pipeline can match requests against its exemption set
/// without parsing URLs.
#[derive(Clone, Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub route: &'static str,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, route: &'static str, url: String) -> Self {
        Self {
            method,
            route,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Look up a header value. Header names compare case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Set a header, replacing any existing value for the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(entry) = self
            .headers
            .iter_mut()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
        {
            entry.1 = value;
        } else {
            self.headers.push((name.to_owned(), value));
        }
    }
}

/// An API response: status plus raw body text. Body decoding is deferred
/// so the pipeline can hand responses through untouched.
#[derive(Clone, Debug)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

/// The seam between the request pipeline and the actual HTTP stack.
pub trait Transport {
    fn send(&self, request: ApiRequest) -> LocalBoxFuture<'_, Result<ApiResponse, ApiError>>;
}

/// Browser transport over `gloo-net`. Requires a browser environment.
#[cfg(feature = "browser")]
#[derive(Debug, Default)]
pub struct FetchTransport;

#[cfg(feature = "browser")]
impl FetchTransport {
    pub fn new() -> Self {
        Self
    }

    async fn dispatch(request: ApiRequest) -> Result<ApiResponse, ApiError> {
        use gloo_net::http::RequestBuilder;

        let mut builder = RequestBuilder::new(&request.url)
            .method(gloo_method(request.method));
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }

        let ready = match request.body {
            Some(body) => builder
                .json(&body)
                .map_err(|e| ApiError::Network(e.to_string()))?,
            None => builder
                .build()
                .map_err(|e| ApiError::Network(e.to_string()))?,
        };

        let response = ready
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        Ok(ApiResponse::new(status, body))
    }
}

#[cfg(feature = "browser")]
fn gloo_method(method: Method) -> gloo_net::http::Method {
    match method {
        Method::Get => gloo_net::http::Method::GET,
        Method::Post => gloo_net::http::Method::POST,
        Method::Put => gloo_net::http::Method::PUT,
        Method::Patch => gloo_net::http::Method::PATCH,
        Method::Delete => gloo_net::http::Method::DELETE,
    }
}

#[cfg(feature = "browser")]
impl Transport for FetchTransport {
    fn send(&self, request: ApiRequest) -> LocalBoxFuture<'_, Result<ApiResponse, ApiError>> {
        Box::pin(Self::dispatch(request))
    }
}
