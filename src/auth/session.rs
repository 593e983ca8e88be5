//! Session store: the single source of truth for the current credential.
//!
//! Credentials live in memory and are mirrored into durable storage under
//! fixed keys so a page reload can recover a previously-authenticated
//! session. Storage is best-effort throughout; when it is unavailable the
//! in-memory copy is authoritative for the page lifetime.
//!
//! DESIGN
//! ======
//! Server payloads are validated before touching state: a login payload is
//! applied all-or-nothing, a refresh payload field-by-field. Malformed
//! payloads are silently rejected rather than partially applied.
//!
//! `clear_session` advances a generation counter. A refresh that settles
//! after the generation moved on (logout raced the renewal) discards its
//! result instead of repopulating a cleared session.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::util::storage::Storage;

const ACCESS_TOKEN_KEY: &str = "hippobox_access_token";
const REFRESH_TOKEN_KEY: &str = "hippobox_refresh_token";
const USER_ID_KEY: &str = "hippobox_user_id";

/// Handle returned by [`SessionStore::subscribe`]; pass it back to
/// [`SessionStore::unsubscribe`] to deregister.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriptionId(u64);

/// Owns the credential triple for the signed-in user.
///
/// All reads and writes go through this store; no other component keeps a
/// mutable copy of the tokens.
pub struct SessionStore {
    access_token: RefCell<Option<String>>,
    refresh_token: RefCell<Option<String>>,
    user_id: RefCell<Option<i64>>,
    generation: Cell<u64>,
    next_subscription: Cell<u64>,
    observers: RefCell<Vec<(u64, Rc<dyn Fn()>)>>,
    storage: Rc<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: Rc<dyn Storage>) -> Self {
        Self {
            access_token: RefCell::new(None),
            refresh_token: RefCell::new(None),
            user_id: RefCell::new(None),
            generation: Cell::new(0),
            next_subscription: Cell::new(0),
            observers: RefCell::new(Vec::new()),
            storage,
        }
    }

    /// Current access token: the in-memory value if set, else the durable
    /// copy (cached into memory on first read). Never fails; `None` means
    /// signed out.
    pub fn access_token(&self) -> Option<String> {
        if let Some(token) = self.access_token.borrow().clone() {
            return Some(token);
        }
        let stored = self.storage.get(ACCESS_TOKEN_KEY)?;
        *self.access_token.borrow_mut() = Some(stored.clone());
        Some(stored)
    }

    pub fn refresh_token(&self) -> Option<String> {
        if let Some(token) = self.refresh_token.borrow().clone() {
            return Some(token);
        }
        let stored = self.storage.get(REFRESH_TOKEN_KEY)?;
        *self.refresh_token.borrow_mut() = Some(stored.clone());
        Some(stored)
    }

    pub fn user_id(&self) -> Option<i64> {
        if let Some(id) = *self.user_id.borrow() {
            return Some(id);
        }
        let stored = self.storage.get(USER_ID_KEY)?.parse::<i64>().ok()?;
        *self.user_id.borrow_mut() = Some(stored);
        Some(stored)
    }

    pub fn set_access_token(&self, token: &str) {
        *self.access_token.borrow_mut() = Some(token.to_owned());
        self.storage.set(ACCESS_TOKEN_KEY, token);
    }

    pub fn set_refresh_token(&self, token: &str) {
        *self.refresh_token.borrow_mut() = Some(token.to_owned());
        self.storage.set(REFRESH_TOKEN_KEY, token);
    }

    pub fn set_user_id(&self, id: i64) {
        *self.user_id.borrow_mut() = Some(id);
        self.storage.set(USER_ID_KEY, &id.to_string());
    }

    /// Apply a login response payload.
    ///
    /// Requires a non-empty `access_token`, a non-empty `refresh_token`,
    /// and a numeric `user.id`. If any of them is missing or of the wrong
    /// type the call is a no-op: the session is left unchanged rather than
    /// partially populated.
    pub fn set_session_from_login(&self, payload: &serde_json::Value) {
        let Some(access_token) = non_empty_str(payload.get("access_token")) else {
            log::warn!("login payload missing access_token, ignoring");
            return;
        };
        let Some(refresh_token) = non_empty_str(payload.get("refresh_token")) else {
            log::warn!("login payload missing refresh_token, ignoring");
            return;
        };
        let Some(user_id) = payload
            .get("user")
            .and_then(|user| user.get("id"))
            .and_then(serde_json::Value::as_i64)
        else {
            log::warn!("login payload missing user id, ignoring");
            return;
        };

        self.set_access_token(access_token);
        self.set_refresh_token(refresh_token);
        self.set_user_id(user_id);
        self.notify();
    }

    /// Apply a refresh response payload. Partial payloads are accepted:
    /// whichever of `access_token`/`refresh_token` is present is updated
    /// and the rest of the session is left untouched.
    pub fn set_session_from_refresh(&self, payload: &serde_json::Value) {
        let access_token = non_empty_str(payload.get("access_token"));
        let refresh_token = non_empty_str(payload.get("refresh_token"));

        if access_token.is_none() && refresh_token.is_none() {
            return;
        }
        if let Some(token) = access_token {
            self.set_access_token(token);
        }
        if let Some(token) = refresh_token {
            self.set_refresh_token(token);
        }
        self.notify();
    }

    /// Drop all credentials, in memory and in durable storage, and advance
    /// the generation so in-flight refreshes discard their results.
    pub fn clear_session(&self) {
        *self.access_token.borrow_mut() = None;
        *self.refresh_token.borrow_mut() = None;
        *self.user_id.borrow_mut() = None;
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(REFRESH_TOKEN_KEY);
        self.storage.remove(USER_ID_KEY);
        self.generation.set(self.generation.get() + 1);
        self.notify();
    }

    /// Generation counter, advanced by [`Self::clear_session`].
    pub fn generation(&self) -> u64 {
        self.generation.get()
    }

    /// Register a callback fired after every session change (login set,
    /// refresh set, clear).
    pub fn subscribe(&self, callback: impl Fn() + 'static) -> SubscriptionId {
        let id = self.next_subscription.get();
        self.next_subscription.set(id + 1);
        self.observers.borrow_mut().push((id, Rc::new(callback)));
        SubscriptionId(id)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.observers.borrow_mut().retain(|(sub, _)| *sub != id.0);
    }

    fn notify(&self) {
        // Snapshot first so callbacks may subscribe/unsubscribe freely.
        let observers: Vec<Rc<dyn Fn()>> = self
            .observers
            .borrow()
            .iter()
            .map(|(_, callback)| Rc::clone(callback))
            .collect();
        for callback in observers {
            callback();
        }
    }
}

fn non_empty_str(value: Option<&serde_json::Value>) -> Option<&str> {
    value
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty())
}
