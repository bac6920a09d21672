//! Liveness check.

use anyhow::Result;
use async_trait::async_trait;

use crate::gateway::{Command, CommandContext, Reply};

pub struct PingCommand;

#[async_trait]
impl Command for PingCommand {
    fn name(&self) -> &'static str {
        "!ping"
    }

    fn usage(&self) -> &'static str {
        "!ping"
    }

    async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<Reply> {
        Ok(Reply::Text("🏓 Pong!".to_string()))
    }
}
