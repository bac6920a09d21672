//! Mention every member of the group: `!all`.

use anyhow::Result;
use async_trait::async_trait;

use crate::gateway::{Command, CommandContext, Reply};
use crate::identity;

pub struct MentionAllCommand;

#[async_trait]
impl Command for MentionAllCommand {
    fn name(&self) -> &'static str {
        "!all"
    }

    fn usage(&self) -> &'static str {
        "!all"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        if let Some(refusal) = super::require_group(ctx) {
            return Ok(refusal);
        }

        let bot = ctx.transport.self_identity();
        let mentions: Vec<String> = ctx
            .transport
            .group_members(ctx.chat)
            .await?
            .into_iter()
            .filter(|m| bot.as_deref() != Some(m.as_str()))
            .collect();

        if mentions.is_empty() {
            return Ok(Reply::Text("No members to mention.".to_string()));
        }

        let roster = mentions
            .iter()
            .map(|k| format!("@{}", identity::handle(k)))
            .collect::<Vec<_>>()
            .join(" ");
        Ok(Reply::TextWithMentions(
            format!("📍 Calling everyone 📍\n{}", roster),
            mentions,
        ))
    }
}
