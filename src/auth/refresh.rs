//! Refresh coordinator: silent access-token renewal, single-flight.
//!
//! At most one refresh call is on the wire at any time. Callers that ask
//! while one is pending join the same shared future and observe the same
//! outcome, so a wave of concurrent 401s produces exactly one network call
//! and one session update.
//!
//! ERROR HANDLING
//! ==============
//! Refresh never raises: the absence of a token is the failure signal.
//! Any failure (transport error, non-success status, malformed body)
//! clears the session so stale credentials are never reused.

#[cfg(test)]
#[path = "refresh_test.rs"]
mod refresh_test;

use std::cell::RefCell;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};
use serde_json::json;

use crate::auth::session::SessionStore;
use crate::config::ApiConfig;
use crate::net::transport::{ApiRequest, Method, Transport};
use crate::net::{AUTH_RETRY_HEADER, routes};

type PendingRefresh = Shared<LocalBoxFuture<'static, Option<String>>>;

/// Deduplicates concurrent token-renewal attempts into one network call.
pub struct RefreshCoordinator {
    config: ApiConfig,
    session: Rc<SessionStore>,
    transport: Rc<dyn Transport>,
    inflight: RefCell<Option<PendingRefresh>>,
}

impl RefreshCoordinator {
    pub fn new(config: ApiConfig, session: Rc<SessionStore>, transport: Rc<dyn Transport>) -> Self {
        Self {
            config,
            session,
            transport,
            inflight: RefCell::new(None),
        }
    }

    /// Renew the access token, joining any refresh already in flight.
    ///
    /// Resolves with the fresh access token, or `None` when the session
    /// could not be renewed (in which case it has been cleared and the
    /// user must re-authenticate).
    pub async fn request_refresh(&self) -> Option<String> {
        let pending = self.inflight.borrow().clone();
        if let Some(pending) = pending {
            return pending.await;
        }

        // Store the shared future before the first await so logically
        // concurrent callers find it and join instead of dialing out again.
        let fut = run_refresh(
            self.config.clone(),
            Rc::clone(&self.session),
            Rc::clone(&self.transport),
        )
        .boxed_local()
        .shared();
        *self.inflight.borrow_mut() = Some(fut.clone());

        let result = fut.await;
        self.inflight.borrow_mut().take();
        result
    }
}

async fn run_refresh(
    config: ApiConfig,
    session: Rc<SessionStore>,
    transport: Rc<dyn Transport>,
) -> Option<String> {
    let (Some(refresh_token), Some(user_id)) = (session.refresh_token(), session.user_id()) else {
        return None;
    };
    let generation = session.generation();

    let mut request = ApiRequest::new(
        Method::Post,
        routes::REFRESH,
        config.url_for(routes::REFRESH),
    )
    .with_body(json!({
        "refresh_token": refresh_token,
        "user_id": user_id,
    }));
    // The refresh call must not itself trigger another refresh.
    request.set_header(AUTH_RETRY_HEADER, "1");

    let outcome = transport.send(request).await;

    // Logout may have raced the renewal; a stale result must neither
    // repopulate nor re-clear the session.
    let stale = session.generation() != generation;

    let payload = match outcome {
        Ok(response) if response.ok() => match response.json::<serde_json::Value>() {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("token refresh returned malformed body: {e}");
                if !stale {
                    session.clear_session();
                }
                return None;
            }
        },
        Ok(response) => {
            log::warn!("token refresh rejected with status {}", response.status);
            if !stale {
                session.clear_session();
            }
            return None;
        }
        Err(e) => {
            log::warn!("token refresh failed: {e}");
            if !stale {
                session.clear_session();
            }
            return None;
        }
    };

    if stale {
        log::debug!("discarding refresh result: session cleared while in flight");
        return None;
    }

    let token = payload
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .filter(|t| !t.is_empty())
        .map(ToOwned::to_owned);

    match token {
        Some(token) => {
            session.set_session_from_refresh(&payload);
            Some(token)
        }
        None => {
            session.clear_session();
            None
        }
    }
}
