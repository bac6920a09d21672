//! Rank assignment: `!addrank @user <Rank>`.
//!
//! Targets come from real mentions when present, otherwise from a numeric
//! argument (so people not in the chat can be pre-registered). The actual
//! hierarchy rules live in the Rank Assignment Engine; this handler only
//! parses and formats.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use tracing::warn;

use crate::auth::AssignError;
use crate::gateway::{Command, CommandContext, Reply};
use crate::identity;

pub struct AddRankCommand;

#[async_trait]
impl Command for AddRankCommand {
    fn name(&self) -> &'static str {
        "!addrank"
    }

    fn usage(&self) -> &'static str {
        "!addrank @user <Rank>"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        if let Some(refusal) = super::require_group(ctx) {
            return Ok(refusal);
        }

        let args = ctx.args();
        let mut targets: Vec<String> = ctx.mentions.to_vec();

        // No mention: accept a phone-style number as the first argument.
        if targets.is_empty() {
            if let Some(arg) = args.get(1) {
                let digits: String = arg.chars().filter(|c| c.is_ascii_digit()).collect();
                if digits.len() >= 10 {
                    if let Some(key) = identity::normalize(&digits) {
                        targets.push(key);
                    }
                }
            }
        }

        if targets.is_empty() {
            return Ok(Reply::Text(format!("Usage: {}", self.usage())));
        }

        // Everything after the target token is the rank name.
        let rank_name = args.get(2..).unwrap_or(&[]).join(" ");
        if rank_name.trim().is_empty() {
            return Ok(Reply::Text(
                "Name the rank. E.g.: !addrank @user Captain".to_string(),
            ));
        }

        // Membership is informational only; fetch failures must not block
        // the assignment.
        let members: Option<HashSet<String>> = match ctx.transport.group_members(ctx.chat).await {
            Ok(list) => Some(list.into_iter().collect()),
            Err(e) => {
                warn!(chat = %ctx.chat.id, error = %e, "could not fetch group members");
                None
            }
        };

        let outcome = match ctx
            .assignments
            .assign_rank(ctx.actor, &targets, &rank_name, members.as_ref())
            .await
        {
            Ok(outcome) => outcome,
            Err(AssignError::RankNotFound(name)) => {
                return Ok(Reply::Text(format!("Rank not found: {}", name)));
            }
            Err(AssignError::Store(e)) => return Err(e.into()),
        };

        // Echo the catalog spelling, not whatever casing the actor typed.
        let display_name = ctx
            .store
            .find_rank_by_name(&rank_name)
            .await?
            .map(|r| r.name)
            .unwrap_or(rank_name);

        let mut parts = Vec::new();
        if !outcome.succeeded.is_empty() {
            parts.push(Reply::TextWithMentions(
                format!(
                    "✅ Rank *{}* assigned to:\n{}",
                    display_name,
                    mention_lines(&outcome.succeeded)
                ),
                outcome.succeeded,
            ));
        }
        if !outcome.failed.is_empty() {
            parts.push(Reply::TextWithMentions(
                format!("❌ Not enough authority for:\n{}", mention_lines(&outcome.failed)),
                outcome.failed,
            ));
        }
        Ok(Reply::Many(parts))
    }
}

fn mention_lines(keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("@{}", identity::handle(k)))
        .collect::<Vec<_>>()
        .join("\n")
}
