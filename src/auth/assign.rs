//! Rank Assignment Engine
//!
//! Enforces the hierarchy rules for handing out ranks: an actor can only
//! grant a rank at or below their own authority, and only to targets they
//! currently outrank (or equal). Authorization for the assignment command
//! itself has already happened; this is the per-action check on top of it.

use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::store::{Store, StoreError};

/// Per-target results of one assignment, preserving input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<String>,
}

/// Failures that abort the whole assignment before any target is touched.
#[derive(Debug, Error)]
pub enum AssignError {
    /// The requested rank name matched nothing in the catalog.
    #[error("rank not found: {0}")]
    RankNotFound(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Assignment engine over an injected store handle.
#[derive(Clone)]
pub struct AssignmentEngine {
    store: Arc<Store>,
}

impl AssignmentEngine {
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Assign `rank_name` to each target, independently.
    ///
    /// Per target, both hierarchy rules must hold: `actor.level <=
    /// rank.level` (cannot hand out more authority than you have) and
    /// `actor.level <= target.level` (cannot act on someone above you).
    /// Targets are materialized in the store (`ensure = true`) because the
    /// action affects them; the actor is read without side effects. A failed
    /// target gets no write at all.
    ///
    /// `group_members` is informational only: targets outside the group are
    /// still eligible, so ranks can be pre-registered for people who will
    /// rejoin.
    pub async fn assign_rank(
        &self,
        actor_key: &str,
        target_keys: &[String],
        rank_name: &str,
        group_members: Option<&HashSet<String>>,
    ) -> Result<AssignmentOutcome, AssignError> {
        let rank = self
            .store
            .find_rank_by_name(rank_name)
            .await?
            .ok_or_else(|| AssignError::RankNotFound(rank_name.to_string()))?;

        let actor = self.store.get_user_rank(actor_key, false).await?;
        let mut outcome = AssignmentOutcome::default();

        for target_key in target_keys {
            if let Some(members) = group_members {
                if !members.contains(target_key) {
                    // Not a gate: assignment to absent members is allowed.
                    info!(target = %target_key, "assigning rank to a non-member");
                }
            }

            let target = self.store.get_user_rank(target_key, true).await?;

            let can_grant_rank = actor.level <= rank.level;
            let outranks_target = actor.level <= target.level;
            if !can_grant_rank || !outranks_target {
                outcome.failed.push(target_key.clone());
                continue;
            }

            self.store
                .set_user_rank(target_key, rank.id, actor_key)
                .await?;
            info!(
                actor = actor_key,
                target = %target_key,
                rank = %rank.name,
                "rank assigned"
            );
            outcome.succeeded.push(target_key.clone());
        }

        Ok(outcome)
    }
}
