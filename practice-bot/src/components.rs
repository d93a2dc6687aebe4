//! Component factory: builds BotComponents from config. Isolates assembly logic from runner.

use anyhow::Result;
use std::sync::Arc;
use storage::{PracticeStore, SqliteStore};
use tracing::{error, info, instrument};

use crate::chain::HandlerChain;
use crate::config::BotConfig;
use crate::conversation::ConversationEngine;
use crate::core::Bot as CoreBot;
use crate::digest::DigestJob;
use crate::handlers::LoggingHandler;
use crate::notify::Notifier;
use crate::session::InMemorySessionStore;
use crate::telegram::TelegramBotAdapter;

/// Everything the runner needs, produced by the component factory.
#[derive(Clone)]
pub struct BotComponents {
    pub store: Arc<dyn PracticeStore>,
    pub teloxide_bot: teloxide::Bot,
    pub bot: Arc<dyn CoreBot>,
    pub engine: Arc<ConversationEngine>,
}

/// Creates the teloxide client, honouring an alternative Bot API URL.
pub fn build_teloxide_bot(config: &BotConfig) -> teloxide::Bot {
    let bot = teloxide::Bot::new(config.bot_token());
    match config.telegram_api_url() {
        Some(url_str) => match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        },
        None => bot,
    }
}

/// Opens the database and creates the schema if needed.
#[instrument(skip(config))]
pub async fn open_store(config: &BotConfig) -> Result<Arc<dyn PracticeStore>> {
    let store = SqliteStore::connect(config.database_url())
        .await
        .map_err(|e| {
            error!(
                error = %e,
                database_url = %config.database_url(),
                "Failed to initialize practice storage"
            );
            anyhow::anyhow!("Failed to initialize practice storage: {}", e)
        })?;
    Ok(Arc::new(store))
}

/// Builds BotComponents with the given store and outbound bot. Tests pass a recording bot.
pub fn build_bot_components(
    config: &BotConfig,
    store: Arc<dyn PracticeStore>,
    bot: Arc<dyn CoreBot>,
    teloxide_bot: teloxide::Bot,
) -> BotComponents {
    let engine = Arc::new(ConversationEngine::new(
        bot.clone(),
        store.clone(),
        Arc::new(InMemorySessionStore::new()),
        config.practice().clone(),
    ));
    info!(
        admins = config.practice().admin_chat_ids.len(),
        environment = ?config.practice().environment,
        "Bot components built"
    );
    BotComponents {
        store,
        teloxide_bot,
        bot,
        engine,
    }
}

/// Initializes BotComponents from config (opens the store, wraps the teloxide client).
#[instrument(skip(config))]
pub async fn initialize_bot_components(config: &BotConfig) -> Result<BotComponents> {
    let store = open_store(config).await?;
    let teloxide_bot = build_teloxide_bot(config);
    let bot: Arc<dyn CoreBot> = Arc::new(TelegramBotAdapter::new(teloxide_bot.clone()));
    Ok(build_bot_components(config, store, bot, teloxide_bot))
}

/// Builds the handler chain (logging → conversation engine).
pub fn build_handler_chain(components: &BotComponents) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(LoggingHandler))
        .add_handler(components.engine.clone())
}

pub fn build_digest_job(config: &BotConfig, components: &BotComponents) -> DigestJob {
    DigestJob::new(
        components.store.clone(),
        Notifier::new(components.bot.clone()),
        config.practice().admin_chat_ids.clone(),
    )
}
