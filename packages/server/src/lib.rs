//! Real-time delivery layer of a team chat backend.
//!
//! Keeps a live registry of authenticated WebSocket connections grouped by
//! team and user, relays inbound frames to the sender's team and fans out
//! newly stored messages to every online channel member with best-effort,
//! non-blocking delivery.

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

// Re-export entry points
pub use ui::{router, run, serve};
