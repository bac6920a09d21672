//! Telegram transport (teloxide).
//!
//! Adapts Telegram updates to [`InboundMessage`] and renders outgoing
//! payloads, including `tg://user` mention links. The gateway itself never
//! sees a teloxide type.

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use teloxide::dispatching::UpdateFilterExt;
use teloxide::dptree;
use teloxide::net::Download;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::*;
use teloxide::types::{
    InputFile, MessageEntityKind, MessageId, ParseMode, ReplyParameters,
};
use tracing::{error, info, warn};

use super::{ChatRef, InboundMessage, Outgoing, Transport};
use crate::gateway::Gateway;
use crate::identity;

pub struct TelegramTransport {
    bot: Bot,
    self_key: String,
}

impl TelegramTransport {
    /// Connect with a bot token and resolve our own identity key.
    pub async fn connect(token: &str) -> Result<Self> {
        let bot = Bot::new(token);
        let me = bot.get_me().await.context("could not reach Telegram")?;
        let self_key = identity::normalize(&me.user.id.0.to_string())
            .context("bot identity did not normalize")?;
        info!("✅ Connected to Telegram as @{}", me.username());
        Ok(Self { bot, self_key })
    }

    /// Run the inbound update loop until shutdown.
    pub async fn run(self: Arc<Self>, gateway: Arc<Gateway>) {
        let handler = Update::filter_message().endpoint(on_message);
        Dispatcher::builder(self.bot.clone(), handler)
            .dependencies(dptree::deps![gateway, self.clone()])
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;
    }

    fn chat_id(chat: &ChatRef) -> Result<ChatId> {
        Ok(ChatId(chat.id.parse().context("non-numeric chat id")?))
    }
}

#[async_trait]
impl Transport for TelegramTransport {
    fn self_identity(&self) -> Option<String> {
        Some(self.self_key.clone())
    }

    async fn send(&self, chat: &ChatRef, out: Outgoing, reply_to: Option<&str>) -> Result<()> {
        let chat_id = Self::chat_id(chat)?;
        match out {
            Outgoing::Text { body, mentions } => {
                let mut req = self
                    .bot
                    .send_message(chat_id, render_markdown(&body, &mentions))
                    .parse_mode(ParseMode::MarkdownV2);
                if let Some(mid) = reply_to.and_then(|s| s.parse::<i32>().ok()) {
                    req = req.reply_parameters(ReplyParameters::new(MessageId(mid)));
                }
                req.await?;
            }
            Outgoing::Sticker(bytes) => {
                self.bot
                    .send_sticker(chat_id, InputFile::memory(bytes))
                    .await?;
            }
        }
        Ok(())
    }

    async fn group_members(&self, chat: &ChatRef) -> Result<Vec<String>> {
        // The Bot API does not expose the full member list; administrators
        // are the best roster a bot can see.
        let admins = self
            .bot
            .get_chat_administrators(Self::chat_id(chat)?)
            .await?;
        Ok(admins
            .iter()
            .filter_map(|m| identity::normalize(&m.user.id.0.to_string()))
            .collect())
    }
}

/// Render a reply body as MarkdownV2: escape reserved characters (keeping
/// `*` so bold spans survive) and replace `@handle` tokens with `tg://user`
/// links so Telegram actually notifies the mentioned users.
fn render_markdown(body: &str, mentions: &[String]) -> String {
    let mut rendered = escape_markdown(body);
    for key in mentions {
        let handle = identity::handle(key);
        rendered = rendered.replace(
            &format!("@{}", handle),
            &format!("[{}](tg://user?id={})", handle, handle),
        );
    }
    rendered
}

fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(
            c,
            '_' | '[' | ']' | '(' | ')' | '~' | '`' | '>' | '#' | '+' | '-' | '=' | '|' | '{'
                | '}' | '.' | '!'
        ) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

async fn on_message(
    bot: Bot,
    msg: Message,
    gateway: Arc<Gateway>,
    transport: Arc<TelegramTransport>,
) -> ResponseResult<()> {
    let sender = match &msg.from {
        Some(user) => user.id.0.to_string(),
        // Channel posts and service messages carry no sender to authorize.
        None => return Ok(()),
    };

    let text = msg
        .text()
        .or_else(|| msg.caption())
        .unwrap_or_default()
        .to_string();
    if !text.trim().starts_with(gateway.prefix()) {
        return Ok(());
    }

    let mut mentions = Vec::new();
    for entity in msg
        .entities()
        .unwrap_or_default()
        .iter()
        .chain(msg.caption_entities().unwrap_or_default())
    {
        if let MessageEntityKind::TextMention { user } = &entity.kind {
            if let Some(key) = identity::normalize(&user.id.0.to_string()) {
                mentions.push(key);
            }
        }
    }

    // Attached image, or the image of the message being replied to.
    let photo = msg
        .photo()
        .or_else(|| msg.reply_to_message().and_then(|m| m.photo()))
        .and_then(|sizes| sizes.last());
    let image = match photo {
        Some(size) => match download_photo(&bot, &size.file.id).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "could not download photo");
                None
            }
        },
        None => None,
    };

    let inbound = InboundMessage {
        chat: ChatRef {
            id: msg.chat.id.0.to_string(),
            is_group: msg.chat.is_group() || msg.chat.is_supergroup(),
        },
        raw_sender: sender,
        message_id: Some(msg.id.0.to_string()),
        text,
        mentions,
        image,
    };

    if let Err(e) = gateway.handle(&inbound, transport.as_ref()).await {
        error!(error = %e, "message handling failed");
    }
    Ok(())
}

async fn download_photo(bot: &Bot, file_id: &str) -> Result<Vec<u8>> {
    let file = bot.get_file(file_id.to_string()).await?;
    let mut bytes = Vec::new();
    bot.download_file(&file.path, &mut bytes).await?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaping_keeps_bold_spans() {
        assert_eq!(
            render_markdown("🎲 Result: *3d6* → Total: *11*.", &[]),
            "🎲 Result: *3d6* → Total: *11*\\."
        );
    }

    #[test]
    fn reserved_characters_are_escaped() {
        assert_eq!(render_markdown("❌ Something went wrong.", &[]), "❌ Something went wrong\\.");
        assert_eq!(render_markdown("!ping (pong)", &[]), "\\!ping \\(pong\\)");
    }

    #[test]
    fn mentions_become_user_links() {
        let rendered = render_markdown("✅ assigned to: @12345", &["12345@telegram".to_string()]);
        assert_eq!(rendered, "✅ assigned to: [12345](tg://user?id=12345)");
    }
}
