//! Session/token lifecycle: credential storage and silent renewal.

pub mod refresh;
pub mod session;
