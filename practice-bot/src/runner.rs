use anyhow::Result;
use chrono::Local;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, instrument, warn};

use crate::components::{build_digest_job, build_handler_chain, initialize_bot_components, open_store};
use crate::config::BotConfig;
use crate::core::{init_tracing, Command};
use crate::digest::DigestReport;
use crate::telegram::{run_with_restarts, RestartPolicy};

/// Runs the bot: validates config, sets up logging and storage, schedules the digest and polls
/// updates until stopped.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file(), config.practice().is_development())?;

    info!(database_url = %config.database_url(), "Initializing bot");

    let components = initialize_bot_components(&config).await?;
    let handler_chain = build_handler_chain(&components);
    let teloxide_bot = components.teloxide_bot.clone();

    let me = teloxide_bot.get_me().await?;
    let bot_username = me.user.username.clone().unwrap_or_default();
    info!(username = %bot_username, "Bot username resolved");

    if let Err(e) = teloxide_bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Could not register the command menu");
    }

    let digest = build_digest_job(&config, &components);
    let digest_hour = config.practice().digest_hour;
    tokio::spawn(digest.run_daily(digest_hour));

    info!("Bot started successfully");

    run_with_restarts(
        teloxide_bot,
        handler_chain,
        bot_username,
        RestartPolicy::default(),
    )
    .await
}

/// Runs both digest parts once for today and exits.
#[instrument(skip(config))]
pub async fn run_digest_once(config: BotConfig) -> Result<DigestReport> {
    config.validate()?;
    init_tracing(config.log_file(), config.practice().is_development())?;

    let components = initialize_bot_components(&config).await?;
    let report = build_digest_job(&config, &components)
        .run_once(Local::now().date_naive())
        .await;
    Ok(report)
}

/// Creates the database schema and exits.
#[instrument(skip(config))]
pub async fn init_database(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(config.log_file(), config.practice().is_development())?;
    open_store(&config).await?;
    info!(database_url = %config.database_url(), "Database ready");
    Ok(())
}
