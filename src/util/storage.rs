//! Durable key-value storage abstraction over `localStorage`.
//!
//! ERROR HANDLING
//! ==============
//! Every operation is best-effort: a missing window, a private-browsing
//! quota error, or a disabled storage backend must never crash the caller.
//! Failures are swallowed and the in-memory session copy stays
//! authoritative for the page lifetime.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::cell::RefCell;
use std::collections::HashMap;

/// Best-effort durable string storage.
///
/// Implementations must not panic or propagate backend failures; a failed
/// read is `None` and a failed write is silently dropped.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// In-memory storage used natively and in tests.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_owned(), value.to_owned());
    }

    fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }
}

/// Browser `localStorage` backend. Requires a browser environment.
#[cfg(feature = "browser")]
#[derive(Debug, Default)]
pub struct LocalStorage;

#[cfg(feature = "browser")]
impl LocalStorage {
    pub fn new() -> Self {
        Self
    }

    fn backend() -> Option<web_sys::Storage> {
        web_sys::window()?.local_storage().ok().flatten()
    }
}

#[cfg(feature = "browser")]
impl Storage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        Self::backend()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Some(storage) = Self::backend() {
            if storage.set_item(key, value).is_err() {
                log::warn!("storage write failed for {key}");
            }
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = Self::backend() {
            let _ = storage.remove_item(key);
        }
    }
}
