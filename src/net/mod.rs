//! Networking: transport seam, authenticated request pipeline, and typed
//! API surface bindings for the HippoBox backend.

pub mod api;
pub mod client;
#[cfg(test)]
pub mod testing;
pub mod transport;
pub mod types;

/// Sentinel header marking a request that must not trigger token refresh:
/// set on the refresh call itself and on post-refresh retries.
pub const AUTH_RETRY_HEADER: &str = "x-auth-retry";

/// Route templates for the HippoBox API. Path parameters stay in `{braces}`
/// in the template; the resolved URL substitutes them. The pipeline matches
/// its exemption set against templates, not resolved URLs.
pub mod routes {
    pub const LOGIN: &str = "/api/v1/auth/login";
    pub const SIGNUP: &str = "/api/v1/auth/signup";
    pub const LOGOUT: &str = "/api/v1/auth/logout";
    pub const REFRESH: &str = "/api/v1/auth/refresh";
    pub const ME: &str = "/api/v1/auth/me";
    pub const VERIFY_EMAIL: &str = "/api/v1/auth/verify-email/{token}";
    pub const VERIFY_EMAIL_RESEND: &str = "/api/v1/auth/verify-email/resend";
    pub const PASSWORD_RESET_REQUEST: &str = "/api/v1/auth/password-reset/request";
    pub const PASSWORD_RESET_CONFIRM: &str = "/api/v1/auth/password-reset/confirm";

    pub const KNOWLEDGE: &str = "/api/v1/knowledge/";
    pub const KNOWLEDGE_LIST: &str = "/api/v1/knowledge/list";
    pub const KNOWLEDGE_SEARCH: &str = "/api/v1/knowledge/search";
    pub const KNOWLEDGE_ITEM: &str = "/api/v1/knowledge/{knowledge_id}";
    pub const KNOWLEDGE_BY_TOPIC: &str = "/api/v1/knowledge/topic/{topic}";

    pub const TOPIC: &str = "/api/v1/topic";

    pub const API_KEY: &str = "/api/v1/api_key";
    pub const API_KEY_ITEM: &str = "/api/v1/api_key/{key_id}";

    pub const APP_CONFIG: &str = "/config";
}

/// Errors surfaced by the API surface bindings.
///
/// The request pipeline itself only produces `Network`; HTTP failure
/// statuses pass through it unchanged and are translated to `Http` by the
/// typed bindings in [`api`](crate::net::api).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Network(String),
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("invalid payload: {0}")]
    Decode(String),
}
