//! Component factory against a file-backed database: config from env, schema creation, a chain
//! built by `build_handler_chain` answering commands, data surviving a reopen.

mod common;

use common::{init_tracing, RecordingBot};
use practice_bot::components::open_store;
use practice_bot::{
    build_bot_components, build_handler_chain, BotConfig, Chat, Command, Event, EventKind, User,
};
use serial_test::serial;
use std::env;
use std::sync::Arc;
use storage::{NewAccount, PracticeStore};
use tempfile::TempDir;

fn config_for(dir: &TempDir) -> BotConfig {
    let db_path = dir.path().join("practice.db");
    env::set_var("DATABASE_URL", format!("sqlite:{}", db_path.display()));
    env::set_var("LOG_FILE", dir.path().join("bot.log").display().to_string());
    env::set_var("ADMIN_CHAT_IDS", "9000");
    env::remove_var("TELEGRAM_API_URL");
    env::remove_var("TELOXIDE_API_URL");
    BotConfig::load(Some("123456:TEST".to_string())).unwrap()
}

fn start_event(chat_id: i64) -> Event {
    Event::new(
        "components_test",
        User {
            id: chat_id,
            username: Some("component_user".to_string()),
            first_name: Some("Иван".to_string()),
            last_name: None,
        },
        Chat::private(chat_id),
        EventKind::Command(Command::Start),
    )
}

/// **Test: the assembled chain answers /start through the injected bot.**
#[tokio::test]
#[serial]
async fn test_built_chain_answers_start() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);

    let store = open_store(&config).await.unwrap();
    let bot = Arc::new(RecordingBot::new());
    let teloxide_bot = teloxide::Bot::new(config.bot_token());
    let components = build_bot_components(&config, store, bot.clone(), teloxide_bot);
    let chain = build_handler_chain(&components);

    chain.handle(&start_event(42)).await.unwrap();

    assert_eq!(bot.count_to(42), 1);
    assert!(dir.path().join("practice.db").exists());
}

/// **Test: reopening the same database file keeps existing rows and re-runs the schema safely.**
#[tokio::test]
#[serial]
async fn test_reopen_keeps_data() {
    init_tracing();
    let dir = TempDir::new().unwrap();
    let config = config_for(&dir);

    let store = open_store(&config).await.unwrap();
    let account = store
        .create_account(NewAccount {
            telegram_id: 42,
            email: "component@example.com".to_string(),
            username: "component_user".to_string(),
            first_name: "Иван".to_string(),
            last_name: "Иванов".to_string(),
            middle_name: None,
        })
        .await
        .unwrap();
    drop(store);

    let reopened = open_store(&config).await.unwrap();
    let found = reopened.find_account_by_chat_id(42).await.unwrap().unwrap();
    assert_eq!(found.id, account.id);
}
