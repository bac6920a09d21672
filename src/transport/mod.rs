//! Messaging Transport
//!
//! The seam between the gateway and the outside world. The gateway only
//! ever talks to `dyn Transport`; the concrete Telegram implementation
//! lives in [`telegram`], and tests drive the gateway with an in-memory
//! mock.

pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Where a message came from / goes to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRef {
    /// Transport-scoped chat identifier.
    pub id: String,
    /// Group chats allow mention-all, draws and assignments by mention.
    pub is_group: bool,
}

/// A message received from the transport, already reduced to what the
/// gateway needs.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub chat: ChatRef,
    /// Raw sender identifier, not yet normalized.
    pub raw_sender: String,
    /// Transport message id, for quoted replies.
    pub message_id: Option<String>,
    pub text: String,
    /// Normalized identity keys of users explicitly mentioned.
    pub mentions: Vec<String>,
    /// Attached or quoted image bytes, when present.
    pub image: Option<Vec<u8>>,
}

/// An outgoing payload. Mentions are rendered by the transport in whatever
/// markup it supports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Text {
        body: String,
        mentions: Vec<String>,
    },
    Sticker(Vec<u8>),
}

impl Outgoing {
    pub fn text(body: impl Into<String>) -> Self {
        Outgoing::Text {
            body: body.into(),
            mentions: Vec::new(),
        }
    }

    pub fn text_with_mentions(body: impl Into<String>, mentions: Vec<String>) -> Self {
        Outgoing::Text {
            body: body.into(),
            mentions,
        }
    }
}

/// Outbound side of the messaging transport.
///
/// Sends are fire-and-forget from the gateway's perspective: a failure is
/// logged by the caller and never retried here.
#[async_trait]
pub trait Transport: Send + Sync {
    /// The bot's own identity key, to keep it out of mentions and draws.
    fn self_identity(&self) -> Option<String>;

    /// Send a message, optionally quoting `reply_to`.
    async fn send(&self, chat: &ChatRef, out: Outgoing, reply_to: Option<&str>) -> Result<()>;

    /// Identity keys of the chat's members, in transport order.
    async fn group_members(&self, chat: &ChatRef) -> Result<Vec<String>>;
}
