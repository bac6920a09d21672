//! Command Handlers
//!
//! One module per command. Handlers own argument parsing and their own
//! effects; authorization has already happened by the time `execute` runs.

mod add_rank;
mod counter;
mod dice;
mod draw;
mod ident;
mod mention_all;
mod ping;
mod rank;
mod set_level;
mod sticker;

pub use add_rank::AddRankCommand;
pub use counter::CounterCommand;
pub use dice::DiceCommand;
pub use draw::DrawCommand;
pub use ident::IdCommand;
pub use mention_all::MentionAllCommand;
pub use ping::PingCommand;
pub use rank::RankCommand;
pub use set_level::SetLevelCommand;
pub use sticker::StickerCommand;

use crate::gateway::{CommandContext, Reply};

/// Standard group-only refusal, shared by the handlers that need a group.
pub(crate) fn require_group(ctx: &CommandContext<'_>) -> Option<Reply> {
    if ctx.chat.is_group {
        None
    } else {
        Some(Reply::Text("⚠️ Use this command in a group.".to_string()))
    }
}
