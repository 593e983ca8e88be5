//! Authentication view state.
//!
//! The UI layer owns rendering and navigation; this struct is the small
//! model it watches. `loading` is true while a session bootstrap (token
//! recovery + `me` fetch) is in progress.

#[cfg(test)]
#[path = "auth_test.rs"]
mod auth_test;

use crate::net::types::User;

/// Authentication state tracking the current user and loading status.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuthState {
    pub user: Option<User>,
    pub loading: bool,
}

impl AuthState {
    pub fn signed_in(&self) -> bool {
        self.user.is_some()
    }

    /// State while a bootstrap or login call is outstanding.
    pub fn pending() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }

    pub fn signed_in_as(user: User) -> Self {
        Self {
            user: Some(user),
            loading: false,
        }
    }
}
