//! Identity echo: shows the sender's key, the chat id and the bot's key.

use anyhow::Result;
use async_trait::async_trait;

use crate::gateway::{Command, CommandContext, Reply};

pub struct IdCommand;

#[async_trait]
impl Command for IdCommand {
    fn name(&self) -> &'static str {
        "!id"
    }

    fn usage(&self) -> &'static str {
        "!id"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        let kind = if ctx.chat.is_group { "group" } else { "direct" };
        let bot = ctx
            .transport
            .self_identity()
            .unwrap_or_else(|| "unknown".to_string());
        let info = [
            format!("👤 *Your key:* {}", ctx.actor),
            format!("💬 *Chat:* {} ({})", ctx.chat.id, kind),
            format!("🤖 *Bot key:* {}", bot),
        ]
        .join("\n");
        Ok(Reply::Text(info))
    }
}
