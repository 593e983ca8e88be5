//! Authenticated request pipeline.
//!
//! Wraps every outbound API call: attaches the bearer credential, detects
//! authorization failures, drives the single-flight refresh, and retries
//! the original request exactly once with the renewed token.
//!
//! ERROR HANDLING
//! ==============
//! The pipeline never invents an error: whatever HTTP response resulted
//! from the (possibly retried) attempt is returned as-is, including 401s
//! it could not recover from. Only transport failures surface as `Err`.

#[cfg(test)]
#[path = "client_test.rs"]
mod client_test;

use std::rc::Rc;

use crate::auth::refresh::RefreshCoordinator;
use crate::auth::session::SessionStore;
use crate::config::ApiConfig;
use crate::net::transport::{ApiRequest, ApiResponse, Transport};
use crate::net::{ApiError, AUTH_RETRY_HEADER, routes};

/// Routes whose 401s are not protected-resource failures and must never
/// trigger a refresh attempt.
const SKIP_REFRESH_ROUTES: [&str; 7] = [
    routes::LOGIN,
    routes::SIGNUP,
    routes::REFRESH,
    routes::PASSWORD_RESET_REQUEST,
    routes::PASSWORD_RESET_CONFIRM,
    routes::VERIFY_EMAIL,
    routes::VERIFY_EMAIL_RESEND,
];

/// Sends API requests with transparent credential attachment and expiry
/// recovery.
pub struct ApiClient {
    config: ApiConfig,
    session: Rc<SessionStore>,
    transport: Rc<dyn Transport>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    pub fn new(config: ApiConfig, session: Rc<SessionStore>, transport: Rc<dyn Transport>) -> Self {
        let refresh = RefreshCoordinator::new(
            config.clone(),
            Rc::clone(&session),
            Rc::clone(&transport),
        );
        Self {
            config,
            session,
            transport,
            refresh,
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn session(&self) -> &Rc<SessionStore> {
        &self.session
    }

    /// Send a request through the full pipeline.
    ///
    /// A 401 from a protected route triggers one silent refresh and one
    /// retry with the renewed token; the retried response is final
    /// whatever its status. 401s from exempt routes, already-retried
    /// requests, and unrecoverable expiries pass through unchanged.
    pub async fn send(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        if request.header("authorization").is_none() {
            if let Some(token) = self.session.access_token() {
                request.set_header("Authorization", format!("Bearer {token}"));
            }
        }

        let response = self.transport.send(request.clone()).await?;
        if response.status != 401 {
            return Ok(response);
        }
        if SKIP_REFRESH_ROUTES.contains(&request.route) {
            return Ok(response);
        }
        if request.header(AUTH_RETRY_HEADER) == Some("1") {
            return Ok(response);
        }

        let Some(token) = self.refresh.request_refresh().await else {
            // Caller sees the original 401 and is responsible for
            // treating the now-cleared session as signed out.
            return Ok(response);
        };

        request.set_header("Authorization", format!("Bearer {token}"));
        request.set_header(AUTH_RETRY_HEADER, "1");
        self.transport.send(request).await
    }
}
