//! # hippobox-client
//!
//! Browser-facing client core for HippoBox, a personal knowledge-base
//! product. This crate owns the session/token lifecycle and the
//! authenticated-request pipeline the UI layer rides on: credential
//! storage with `localStorage` mirroring, single-flight silent token
//! refresh, transparent 401 recovery with retry-once semantics, and typed
//! bindings for the HippoBox HTTP API.
//!
//! Browser integration (fetch transport, `localStorage`) is gated behind
//! the `browser` feature; everything else runs natively, which is how the
//! test suite exercises the concurrency-sensitive paths.

pub mod auth;
pub mod config;
pub mod net;
pub mod state;
pub mod util;

/// Install browser logging and panic reporting. Call once at startup.
#[cfg(feature = "browser")]
#[wasm_bindgen::prelude::wasm_bindgen]
pub fn init() {
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Debug);
}
