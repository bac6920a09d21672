//! Random draw among group members: `!draw <n>`.

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::SliceRandom;

use crate::gateway::{Command, CommandContext, Reply};
use crate::identity;

pub struct DrawCommand;

#[async_trait]
impl Command for DrawCommand {
    fn name(&self) -> &'static str {
        "!draw"
    }

    fn usage(&self) -> &'static str {
        "!draw <count>"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        if let Some(refusal) = super::require_group(ctx) {
            return Ok(refusal);
        }

        let args = ctx.args();
        let count = match args.get(1) {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n >= 1 => n,
                _ => return Ok(Reply::Text(format!("Usage: {}", self.usage()))),
            },
            None => 1,
        };

        let bot = ctx.transport.self_identity();
        let members: Vec<String> = ctx
            .transport
            .group_members(ctx.chat)
            .await?
            .into_iter()
            .filter(|m| bot.as_deref() != Some(m.as_str()))
            .collect();

        if members.len() < count {
            return Ok(Reply::Text("Not enough participants to draw.".to_string()));
        }

        let mut rng = rand::thread_rng();
        let chosen: Vec<String> = members
            .choose_multiple(&mut rng, count)
            .cloned()
            .collect();

        let text = if chosen.len() == 1 {
            format!("🎉 The winner is: @{}", identity::handle(&chosen[0]))
        } else {
            format!(
                "🎉 Winners:\n{}",
                chosen
                    .iter()
                    .map(|k| format!("@{}", identity::handle(k)))
                    .collect::<Vec<_>>()
                    .join("\n")
            )
        };
        Ok(Reply::TextWithMentions(text, chosen))
    }
}
