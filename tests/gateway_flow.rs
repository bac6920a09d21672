//! End-to-end gateway scenarios over a real (temp-file) store and a
//! recording in-memory transport.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

use garrison::commands::{
    AddRankCommand, CounterCommand, DiceCommand, DrawCommand, IdCommand, MentionAllCommand,
    PingCommand, RankCommand, SetLevelCommand, StickerCommand,
};
use garrison::gateway::{Command, CommandContext, Gateway, Reply};
use garrison::store::Store;
use garrison::transport::{ChatRef, InboundMessage, Outgoing, Transport};

const BOT_KEY: &str = "99@telegram";

/// Records outgoing traffic instead of talking to a real network.
struct MockTransport {
    sent: Mutex<Vec<(ChatRef, Outgoing, Option<String>)>>,
    members: Vec<String>,
}

impl MockTransport {
    fn new(members: &[&str]) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            members: members.iter().map(|m| m.to_string()).collect(),
        }
    }

    fn sent(&self) -> Vec<(ChatRef, Outgoing, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }

    fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|(_, out, _)| match out {
                Outgoing::Text { body, .. } => Some(body),
                Outgoing::Sticker(_) => None,
            })
            .collect()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn self_identity(&self) -> Option<String> {
        Some(BOT_KEY.to_string())
    }

    async fn send(&self, chat: &ChatRef, out: Outgoing, reply_to: Option<&str>) -> Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((chat.clone(), out, reply_to.map(|s| s.to_string())));
        Ok(())
    }

    async fn group_members(&self, _chat: &ChatRef) -> Result<Vec<String>> {
        Ok(self.members.clone())
    }
}

struct Fixture {
    store: Arc<Store>,
    gateway: Gateway,
    transport: MockTransport,
    _db: NamedTempFile,
}

async fn fixture() -> Fixture {
    let db = NamedTempFile::new().expect("temp db");
    let store = Arc::new(Store::open(db.path()).await.expect("open store"));
    store.bootstrap().await.expect("bootstrap");

    let mut gateway = Gateway::new(store.clone(), '!');
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

    Fixture {
        store,
        gateway,
        transport: MockTransport::new(&["1@telegram", "2@telegram", BOT_KEY]),
        _db: db,
    }
}

fn group_msg(sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        chat: ChatRef {
            id: "-100".to_string(),
            is_group: true,
        },
        raw_sender: sender.to_string(),
        message_id: Some("42".to_string()),
        text: text.to_string(),
        mentions: Vec::new(),
        image: None,
    }
}

fn direct_msg(sender: &str, text: &str) -> InboundMessage {
    InboundMessage {
        chat: ChatRef {
            id: "7".to_string(),
            is_group: false,
        },
        raw_sender: sender.to_string(),
        message_id: None,
        text: text.to_string(),
        mentions: Vec::new(),
        image: None,
    }
}

async fn promote(store: &Store, key: &str, rank: &str) {
    let rank = store.find_rank_by_name(rank).await.unwrap().unwrap();
    store.set_user_rank(key, rank.id, "root@telegram").await.unwrap();
}

#[tokio::test]
async fn non_command_text_is_ignored() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "hello everyone"), &fx.transport)
        .await
        .unwrap();
    assert!(fx.transport.sent().is_empty());
}

#[tokio::test]
async fn unresolvable_sender_is_dropped_silently() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("   ", "!ping"), &fx.transport)
        .await
        .unwrap();
    assert!(fx.transport.sent().is_empty());
}

#[tokio::test]
async fn ping_replies_quoting_the_message() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "!ping"), &fx.transport)
        .await
        .unwrap();
    let sent = fx.transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, Outgoing::text("🏓 Pong!"));
    assert_eq!(sent[0].2.as_deref(), Some("42"));
}

#[tokio::test]
async fn command_token_is_case_insensitive() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "!PING extra words"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(fx.transport.sent_texts(), vec!["🏓 Pong!".to_string()]);
}

#[tokio::test]
async fn blocked_sender_is_denied_even_for_unknown_commands() {
    let fx = fixture().await;
    fx.store.set_blocked("1@telegram", true).await.unwrap();

    fx.gateway
        .handle(&group_msg("1", "!no-such-command"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts(),
        vec!["🚫 You are blocked.".to_string()]
    );
}

#[tokio::test]
async fn unknown_command_gets_fixed_reply() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "!frobnicate"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts(),
        vec!["Unknown or disabled command.".to_string()]
    );
}

#[tokio::test]
async fn insufficient_rank_gets_fixed_reply() {
    let fx = fixture().await;
    // Default rank is level 5; !all requires 2.
    fx.gateway
        .handle(&group_msg("1", "!all"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts(),
        vec!["🚫 Insufficient rank.".to_string()]
    );
}

#[tokio::test]
async fn mention_all_excludes_the_bot() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "captain").await;

    fx.gateway
        .handle(&group_msg("1", "!all"), &fx.transport)
        .await
        .unwrap();
    let sent = fx.transport.sent();
    assert_eq!(sent.len(), 1);
    match &sent[0].1 {
        Outgoing::Text { body, mentions } => {
            assert!(body.contains("📍"));
            assert_eq!(
                mentions,
                &vec!["1@telegram".to_string(), "2@telegram".to_string()]
            );
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

#[tokio::test]
async fn addrank_happy_path_persists_with_audit() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "general").await;

    let mut msg = group_msg("1", "!addrank @2 Captain");
    msg.mentions = vec!["2@telegram".to_string()];
    fx.gateway.handle(&msg, &fx.transport).await.unwrap();

    let texts = fx.transport.sent_texts();
    assert_eq!(texts.len(), 1);
    assert!(texts[0].contains("✅ Rank *Captain* assigned to:"), "{}", texts[0]);
    assert!(texts[0].contains("@2"));

    let detail = fx
        .store
        .user_rank_detail("2@telegram")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.rank_name.as_deref(), Some("Captain"));
    assert_eq!(detail.assigned_by.as_deref(), Some("1@telegram"));
}

#[tokio::test]
async fn addrank_mixed_batch_reports_both_lists() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "captain").await; // level 2
    promote(&fx.store, "3@telegram", "general").await; // above the actor

    let mut msg = group_msg("1", "!addrank @targets Soldier");
    msg.mentions = vec!["2@telegram".to_string(), "3@telegram".to_string()];
    fx.gateway.handle(&msg, &fx.transport).await.unwrap();

    let texts = fx.transport.sent_texts();
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("✅") && texts[0].contains("@2"));
    assert!(texts[1].contains("❌") && texts[1].contains("@3"));

    // The outranked target kept their rank.
    let detail = fx
        .store
        .user_rank_detail("3@telegram")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.rank_name.as_deref(), Some("General"));
}

#[tokio::test]
async fn addrank_unknown_rank_is_echoed_back() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "general").await;

    let mut msg = group_msg("1", "!addrank @2 Pirate");
    msg.mentions = vec!["2@telegram".to_string()];
    fx.gateway.handle(&msg, &fx.transport).await.unwrap();

    assert_eq!(
        fx.transport.sent_texts(),
        vec!["Rank not found: Pirate".to_string()]
    );
}

#[tokio::test]
async fn addrank_requires_a_group() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "general").await;

    fx.gateway
        .handle(&direct_msg("1", "!addrank 5511999887766 Captain"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts(),
        vec!["⚠️ Use this command in a group.".to_string()]
    );
}

#[tokio::test]
async fn addrank_accepts_numeric_target_argument() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "general").await;

    fx.gateway
        .handle(
            &group_msg("1", "!addrank 5511999887766 Sergeant"),
            &fx.transport,
        )
        .await
        .unwrap();

    let detail = fx
        .store
        .user_rank_detail("5511999887766@telegram")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.rank_name.as_deref(), Some("Sergeant"));
}

#[tokio::test]
async fn setlevel_changes_take_effect_immediately() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "owner").await;

    fx.gateway
        .handle(&group_msg("1", "!setlevel !dice 1"), &fx.transport)
        .await
        .unwrap();
    assert!(fx.transport.sent_texts()[0].contains("now requires level *1*"));

    // A default-rank user is now locked out of !dice.
    fx.gateway
        .handle(&group_msg("2", "!dice 3d6"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts().last().unwrap(),
        "🚫 Insufficient rank."
    );
}

#[tokio::test]
async fn setlevel_unknown_command_reports_not_found() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "owner").await;

    fx.gateway
        .handle(&group_msg("1", "!setlevel !nope 3"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts(),
        vec!["Command not found: !nope".to_string()]
    );
}

#[tokio::test]
async fn lost_counter_accumulates() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "!lost"), &fx.transport)
        .await
        .unwrap();
    fx.gateway
        .handle(&group_msg("2", "!lost"), &fx.transport)
        .await
        .unwrap();

    let texts = fx.transport.sent_texts();
    assert!(texts[0].contains("*1*"));
    assert!(texts[1].contains("*2*"));
}

#[tokio::test]
async fn dice_rolls_stay_in_range() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "!dice 3d6"), &fx.transport)
        .await
        .unwrap();
    let texts = fx.transport.sent_texts();
    assert!(texts[0].starts_with("🎲 Result: *3d6*"), "{}", texts[0]);
}

#[tokio::test]
async fn draw_picks_distinct_members() {
    let fx = fixture().await;
    promote(&fx.store, "1@telegram", "sergeant").await; // !draw needs level 3

    fx.gateway
        .handle(&group_msg("1", "!draw 2"), &fx.transport)
        .await
        .unwrap();
    let sent = fx.transport.sent();
    match &sent[0].1 {
        Outgoing::Text { mentions, .. } => {
            assert_eq!(mentions.len(), 2);
            assert!(!mentions.contains(&BOT_KEY.to_string()));
            assert_ne!(mentions[0], mentions[1]);
        }
        other => panic!("unexpected payload: {:?}", other),
    }
}

/// Stands in for a handler hitting a store outage mid-execution.
struct FaultyCommand;

#[async_trait]
impl Command for FaultyCommand {
    fn name(&self) -> &'static str {
        "!ping"
    }

    fn usage(&self) -> &'static str {
        "!ping"
    }

    async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<Reply> {
        Err(anyhow::anyhow!("database is locked"))
    }
}

#[tokio::test]
async fn handler_fault_gets_the_generic_apology() {
    let db = NamedTempFile::new().expect("temp db");
    let store = Arc::new(Store::open(db.path()).await.expect("open store"));
    store.bootstrap().await.expect("bootstrap");
    let mut gateway = Gateway::new(store, '!');
    gateway.register(FaultyCommand);

    let transport = MockTransport::new(&[]);
    gateway
        .handle(&group_msg("1", "!ping"), &transport)
        .await
        .unwrap();
    assert_eq!(
        transport.sent_texts(),
        vec!["❌ Something went wrong.".to_string()]
    );
}

/// A transport whose network is down: every outbound call errors.
struct DownTransport;

#[async_trait]
impl Transport for DownTransport {
    fn self_identity(&self) -> Option<String> {
        Some(BOT_KEY.to_string())
    }

    async fn send(&self, _chat: &ChatRef, _out: Outgoing, _reply_to: Option<&str>) -> Result<()> {
        Err(anyhow::anyhow!("network unreachable"))
    }

    async fn group_members(&self, _chat: &ChatRef) -> Result<Vec<String>> {
        Err(anyhow::anyhow!("network unreachable"))
    }
}

#[tokio::test]
async fn send_failure_aborts_only_the_current_message() {
    let fx = fixture().await;

    // The failed delivery is swallowed, not propagated.
    fx.gateway
        .handle(&group_msg("1", "!ping"), &DownTransport)
        .await
        .unwrap();

    // The next message over a healthy transport goes through untouched.
    fx.gateway
        .handle(&group_msg("1", "!ping"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(fx.transport.sent_texts(), vec!["🏓 Pong!".to_string()]);
}

#[tokio::test]
async fn sticker_without_image_explains_usage() {
    let fx = fixture().await;
    fx.gateway
        .handle(&group_msg("1", "!sticker"), &fx.transport)
        .await
        .unwrap();
    assert_eq!(
        fx.transport.sent_texts(),
        vec!["⚠️ Send or reply to an image to make a sticker.".to_string()]
    );
}
