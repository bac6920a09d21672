//! Garrison — group-chat command gateway
//!
//! Bootstrap: environment → store → command registry → Telegram loop.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use garrison::commands::{
    AddRankCommand, CounterCommand, DiceCommand, DrawCommand, IdCommand, MentionAllCommand,
    PingCommand, RankCommand, SetLevelCommand, StickerCommand,
};
use garrison::config::Config;
use garrison::gateway::Gateway;
use garrison::store::Store;
use garrison::transport::telegram::TelegramTransport;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config = Config::from_env();

    // Store unavailability (or an empty catalog) is fatal here; nothing can
    // be authorized without a default rank.
    let store = Arc::new(
        Store::open(&config.db_path)
            .await
            .context("could not open store")?,
    );
    store.bootstrap().await.context("could not seed store")?;
    let default = store.default_rank().await?;
    info!(
        "📦 Store ready at '{}' (default rank: {})",
        config.db_path, default.name
    );

    let mut gateway = Gateway::new(store, config.command_prefix);
    gateway
        .register(PingCommand)
        .register(IdCommand)
        .register(RankCommand)
        .register(AddRankCommand)
        .register(SetLevelCommand)
        .register(DiceCommand)
        .register(MentionAllCommand)
        .register(DrawCommand)
        .register(StickerCommand)
        .register(CounterCommand::lost());
    info!("🔧 Commands: {}", gateway.command_names().join(", "));
    let gateway = Arc::new(gateway);

    let token = config
        .bot_token
        .context("TELEGRAM_BOT_TOKEN is not set")?;
    let transport = Arc::new(TelegramTransport::connect(&token).await?);

    transport.run(gateway).await;
    info!("👋 Shutting down");
    Ok(())
}
