//! Authorization Engine
//!
//! Decides whether an identity may invoke a command. Denials are ordinary
//! values with a fixed user-facing message each; only store faults are
//! errors. The check itself never creates identity rows — passersby who
//! merely trigger a permission check leave no trace in the store.

pub mod assign;

pub use assign::{AssignError, AssignmentEngine, AssignmentOutcome};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::store::{Store, StoreError};

/// Outcome of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Allowed,
    Denied(DenyReason),
}

/// Why a command was denied. Each variant maps to one fixed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// The identity is blocked; denied before anything else is consulted.
    Blocked,
    /// No such command, or the command is disabled (indistinguishable on
    /// purpose).
    UnknownOrDisabled,
    /// The actor's rank level is above the command's minimum (less
    /// authority than required).
    InsufficientRank,
}

impl DenyReason {
    /// The fixed reply sent for this denial.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::Blocked => "🚫 You are blocked.",
            DenyReason::UnknownOrDisabled => "Unknown or disabled command.",
            DenyReason::InsufficientRank => "🚫 Insufficient rank.",
        }
    }
}

/// Authorization engine over an injected store handle.
#[derive(Clone)]
pub struct AuthEngine {
    store: Arc<Store>,
}

impl AuthEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Decide whether `identity_key` may invoke `command_name`.
    ///
    /// Evaluation order is fixed and user-visible: blocked first (even for
    /// unknown commands), then command existence/enablement, then level.
    pub async fn authorize(
        &self,
        identity_key: &str,
        command_name: &str,
    ) -> Result<Decision, StoreError> {
        let actor = self.store.get_user_rank(identity_key, false).await?;
        if actor.blocked {
            debug!(actor = identity_key, command = command_name, "denied: blocked");
            return Ok(Decision::Denied(DenyReason::Blocked));
        }

        let policy = match self.store.get_policy(command_name).await? {
            Some(p) if p.enabled => p,
            _ => {
                debug!(
                    actor = identity_key,
                    command = command_name,
                    "denied: unknown or disabled"
                );
                return Ok(Decision::Denied(DenyReason::UnknownOrDisabled));
            }
        };

        if actor.level > policy.min_level {
            debug!(
                actor = identity_key,
                command = command_name,
                actor_level = actor.level,
                min_level = policy.min_level,
                "denied: insufficient rank"
            );
            return Ok(Decision::Denied(DenyReason::InsufficientRank));
        }

        Ok(Decision::Allowed)
    }
}
