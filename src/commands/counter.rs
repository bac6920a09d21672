//! Named counter commands (`!lost` and friends): one shared handler
//! configured per token at registration time.

use anyhow::Result;
use async_trait::async_trait;

use crate::gateway::{Command, CommandContext, Reply};

pub struct CounterCommand {
    token: &'static str,
    counter: &'static str,
    /// Reply template; `{}` is replaced with the new count.
    template: &'static str,
}

impl CounterCommand {
    pub fn new(token: &'static str, counter: &'static str, template: &'static str) -> Self {
        Self {
            token,
            counter,
            template,
        }
    }

    /// The `!lost` counter from the stock deployment.
    pub fn lost() -> Self {
        Self::new("!lost", "lost", "😔 We've lost *{}* time(s).")
    }
}

#[async_trait]
impl Command for CounterCommand {
    fn name(&self) -> &'static str {
        self.token
    }

    fn usage(&self) -> &'static str {
        self.token
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply> {
        if let Some(refusal) = super::require_group(ctx) {
            return Ok(refusal);
        }

        let value = ctx.store.increment_counter(self.counter).await?;
        Ok(Reply::Text(self.template.replace("{}", &value.to_string())))
    }
}
