//! Shared utilities for Hubbub binaries and libraries.

pub mod logger;
pub mod time;
