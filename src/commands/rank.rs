//! Shows the sender's current rank and its audit trail.

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;

use crate::gateway::{Command, CommandContext, Reply};
use crate::identity;

pub struct RankCommand;

#[async_trait]
impl Command for RankCommand {
    fn name(&self) -> &'static str {
        "!rank"
    }

    fn usage(&self) -> &'static str {
        "!rank"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        let detail = ctx.store.user_rank_detail(ctx.actor).await?;
        let default = ctx.store.default_rank().await?;

        let (rank_name, assigned_by, assigned_at) = match detail {
            Some(d) => (
                d.rank_name.unwrap_or_else(|| default.name.clone()),
                d.assigned_by,
                d.assigned_at,
            ),
            None => (default.name.clone(), None, None),
        };

        let mut text = format!("🏷️ Your rank: *{}*", rank_name);
        let mut mentions = Vec::new();
        if let Some(by) = assigned_by {
            text.push_str(&format!("\n👤 Assigned by: @{}", identity::handle(&by)));
            mentions.push(by);
        }
        if let Some(at) = assigned_at {
            if let Ok(date) = DateTime::parse_from_rfc3339(&at) {
                text.push_str(&format!("\n📅 Since: {}", date.format("%Y-%m-%d")));
            }
        }

        Ok(Reply::TextWithMentions(text, mentions))
    }
}
