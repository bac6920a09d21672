//! Registry mutation: `!setlevel <command> <level>`.

use anyhow::Result;
use async_trait::async_trait;

use crate::gateway::{Command, CommandContext, Reply};

pub struct SetLevelCommand;

#[async_trait]
impl Command for SetLevelCommand {
    fn name(&self) -> &'static str {
        "!setlevel"
    }

    fn usage(&self) -> &'static str {
        "!setlevel <command> <level>  e.g.: !setlevel !dice 4"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        let args = ctx.args();
        let target = args.get(1).map(|t| t.to_lowercase());
        let level = args.get(2).and_then(|t| t.parse::<i64>().ok());

        let (target, level) = match (target, level) {
            (Some(t), Some(l)) => (t, l),
            _ => return Ok(Reply::Text(format!("Usage: {}", self.usage()))),
        };

        if ctx.store.set_min_level(&target, level).await? {
            Ok(Reply::Text(format!(
                "✅ Command *{}* now requires level *{}*.",
                target, level
            )))
        } else {
            Ok(Reply::Text(format!("Command not found: {}", target)))
        }
    }
}
