//! Garrison — group-chat command gateway
//!
//! Receives text commands over a group-messaging transport, authorizes them
//! against a per-user hierarchical rank (lower level = more authority), and
//! dispatches to a small set of handlers. Ranks, command policies and
//! counters live in SQLite; the transport and store are injected at the
//! seams so the engines stay transport-agnostic and testable.

pub mod auth;
pub mod commands;
pub mod config;
pub mod gateway;
pub mod identity;
pub mod store;
pub mod transport;

// Re-exports for convenience
pub use auth::{AssignmentEngine, AuthEngine, Decision, DenyReason};
pub use gateway::{Command, Gateway, Reply};
pub use store::Store;
pub use transport::Transport;
