//! Environment configuration.

use std::env;

/// Runtime configuration, read once at startup.
pub struct Config {
    /// Telegram bot token; absent means the binary cannot start a transport.
    pub bot_token: Option<String>,
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Leading character that marks a command.
    pub command_prefix: char,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            bot_token: env::var("TELEGRAM_BOT_TOKEN").ok(),
            db_path: env::var("GARRISON_DB").unwrap_or_else(|_| "garrison.db".to_string()),
            command_prefix: env::var("COMMAND_PREFIX")
                .ok()
                .and_then(|s| s.chars().next())
                .unwrap_or('!'),
        }
    }
}
