//! Command Gateway
//!
//! Thin routing between the transport and the command handlers: normalize
//! the sender, parse the command token, run the Authorization Engine, then
//! hand off to the registered handler. No policy lives here — adding a
//! command never touches the authorization logic.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::auth::{AssignmentEngine, AuthEngine, Decision};
use crate::identity;
use crate::store::Store;
use crate::transport::{ChatRef, InboundMessage, Outgoing, Transport};

/// Generic reply when a handler or the store fails mid-command.
const FAULT_MESSAGE: &str = "❌ Something went wrong.";

/// Everything a handler gets to work with.
pub struct CommandContext<'a> {
    /// Normalized identity key of the sender.
    pub actor: &'a str,
    pub chat: &'a ChatRef,
    /// Full raw text, for argument parsing.
    pub text: &'a str,
    /// Normalized identity keys mentioned in the message.
    pub mentions: &'a [String],
    /// Attached or quoted image bytes, when present.
    pub image: Option<&'a [u8]>,
    pub transport: &'a dyn Transport,
    pub store: &'a Store,
    pub assignments: &'a AssignmentEngine,
}

impl CommandContext<'_> {
    /// Whitespace-delimited tokens of the message, command token included.
    pub fn args(&self) -> Vec<&str> {
        self.text.split_whitespace().collect()
    }
}

/// What a handler wants sent back, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    TextWithMentions(String, Vec<String>),
    Sticker(Vec<u8>),
    /// Multiple payloads, sent in order (e.g. succeeded + failed lists).
    Many(Vec<Reply>),
    None,
}

/// A command handler. The gateway authorizes before `execute` runs; the
/// handler owns only its own argument parsing and effects.
#[async_trait]
pub trait Command: Send + Sync {
    /// The literal command token, prefix included, lowercase.
    fn name(&self) -> &'static str;

    /// One-line usage hint, echoed on argument errors by the handler.
    fn usage(&self) -> &'static str;

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<Reply>;
}

/// Routes inbound messages to handlers, gated by the Authorization Engine.
pub struct Gateway {
    commands: HashMap<&'static str, Arc<dyn Command>>,
    auth: AuthEngine,
    assignments: AssignmentEngine,
    store: Arc<Store>,
    prefix: char,
}

impl Gateway {
    pub fn new(store: Arc<Store>, prefix: char) -> Self {
        Self {
            commands: HashMap::new(),
            auth: AuthEngine::new(store.clone()),
            assignments: AssignmentEngine::new(store.clone()),
            store,
            prefix,
        }
    }

    /// Register a handler under its own token.
    pub fn register<C: Command + 'static>(&mut self, command: C) -> &mut Self {
        self.commands.insert(command.name(), Arc::new(command));
        self
    }

    pub fn prefix(&self) -> char {
        self.prefix
    }

    pub fn command_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Handle one inbound message end to end.
    ///
    /// Unresolvable senders and non-command text are dropped silently.
    /// Denials get their fixed reply; handler/store faults get a generic
    /// apology and abort only this message.
    pub async fn handle(&self, msg: &InboundMessage, transport: &dyn Transport) -> Result<()> {
        let actor = match identity::normalize(&msg.raw_sender) {
            Some(key) => key,
            None => {
                debug!(raw = %msg.raw_sender, "dropping message: unresolvable sender");
                return Ok(());
            }
        };

        let text = msg.text.trim();
        if !text.starts_with(self.prefix) {
            return Ok(());
        }
        let token = match text.split_whitespace().next() {
            Some(t) => t.to_lowercase(),
            None => return Ok(()),
        };

        let reply_to = msg.message_id.as_deref();
        match self.auth.authorize(&actor, &token).await {
            Ok(Decision::Allowed) => {}
            Ok(Decision::Denied(reason)) => {
                self.send(transport, &msg.chat, Outgoing::text(reason.message()), reply_to)
                    .await;
                return Ok(());
            }
            Err(e) => {
                error!(command = %token, error = %e, "authorization failed");
                self.send(transport, &msg.chat, Outgoing::text(FAULT_MESSAGE), reply_to)
                    .await;
                return Ok(());
            }
        }

        // Authorization said Allowed, so the token is a known enabled
        // command; a missing handler is a wiring bug, not user error.
        let handler = match self.commands.get(token.as_str()) {
            Some(h) => h.clone(),
            None => {
                warn!(command = %token, "policy row exists but no handler is registered");
                return Ok(());
            }
        };

        let ctx = CommandContext {
            actor: &actor,
            chat: &msg.chat,
            text,
            mentions: &msg.mentions,
            image: msg.image.as_deref(),
            transport,
            store: &self.store,
            assignments: &self.assignments,
        };

        match handler.execute(&ctx).await {
            Ok(reply) => {
                self.deliver(transport, &msg.chat, reply, reply_to).await;
            }
            Err(e) => {
                error!(command = %token, error = %e, "command failed");
                self.send(transport, &msg.chat, Outgoing::text(FAULT_MESSAGE), reply_to)
                    .await;
            }
        }
        Ok(())
    }

    async fn deliver(
        &self,
        transport: &dyn Transport,
        chat: &ChatRef,
        reply: Reply,
        reply_to: Option<&str>,
    ) {
        for out in flatten_reply(reply) {
            self.send(transport, chat, out, reply_to).await;
        }
    }

    /// Fire-and-forget send; transport failures abort only this message.
    async fn send(
        &self,
        transport: &dyn Transport,
        chat: &ChatRef,
        out: Outgoing,
        reply_to: Option<&str>,
    ) {
        if let Err(e) = transport.send(chat, out, reply_to).await {
            warn!(chat = %chat.id, error = %e, "transport send failed");
        }
    }
}

/// Flatten a handler reply into transport payloads, in send order.
fn flatten_reply(reply: Reply) -> Vec<Outgoing> {
    match reply {
        Reply::None => Vec::new(),
        Reply::Text(body) => vec![Outgoing::text(body)],
        Reply::TextWithMentions(body, mentions) => {
            vec![Outgoing::text_with_mentions(body, mentions)]
        }
        Reply::Sticker(bytes) => vec![Outgoing::Sticker(bytes)],
        Reply::Many(parts) => parts.into_iter().flat_map(flatten_reply).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flatten_preserves_order_and_skips_empty() {
        let reply = Reply::Many(vec![
            Reply::Text("a".into()),
            Reply::None,
            Reply::Many(vec![Reply::Text("b".into())]),
        ]);
        assert_eq!(
            flatten_reply(reply),
            vec![Outgoing::text("a"), Outgoing::text("b")]
        );
    }
}
