//! Shared client utilities.

pub mod storage;
