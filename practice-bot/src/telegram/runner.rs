//! Dispatcher runner: converts teloxide updates to core events and passes them to the
//! HandlerChain. Fatal polling errors shut the dispatcher down; [`run_with_restarts`] brings it
//! back under a [`RestartPolicy`].

use crate::chain::HandlerChain;
use crate::core::ToCoreEvent;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
use teloxide::update_listeners;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, Message, Update};
use teloxide::RequestError;
use tracing::{debug, error, info, instrument, warn};

use super::adapters::{TelegramCallbackWrapper, TelegramMessageWrapper};
use super::restart::{is_fatal_polling_error, RestartDecision, RestartPolicy};

/// Bot username used to accept `/command@username`.
#[derive(Clone)]
struct BotUsername(Arc<str>);

/// Set once the dispatcher has received any update.
#[derive(Clone)]
struct PollActivity(Arc<AtomicBool>);

impl PollActivity {
    fn mark(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Stopped on request (Ctrl-C).
    Stopped,
    /// Shut down after a fatal polling error. `received_updates` tells whether polling worked
    /// at all before the failure.
    Fatal { received_updates: bool },
}

async fn run_chain(chain: &HandlerChain, event: crate::core::Event) {
    if let Err(e) = chain.handle(&event).await {
        error!(error = %e, user_id = event.user.id, chat_id = event.chat.id, "Handler chain failed");
    }
}

async fn on_message(
    msg: Message,
    chain: HandlerChain,
    username: BotUsername,
    activity: PollActivity,
) -> ResponseResult<()> {
    activity.mark();
    match TelegramMessageWrapper(&msg).to_event(&username.0) {
        Some(event) => run_chain(&chain, event).await,
        None => debug!(chat_id = msg.chat.id.0, "Non-text message ignored"),
    }
    Ok(())
}

async fn on_callback(
    bot: teloxide::Bot,
    query: CallbackQuery,
    chain: HandlerChain,
    username: BotUsername,
    activity: PollActivity,
) -> ResponseResult<()> {
    activity.mark();
    // Stops the client-side spinner whether or not the press is acted on.
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        debug!(error = %e, "Could not answer callback query");
    }
    match TelegramCallbackWrapper(&query).to_event(&username.0) {
        Some(event) => run_chain(&chain, event).await,
        None => debug!(user_id = query.from.id.0, data = ?query.data, "Unusable callback ignored"),
    }
    Ok(())
}

/// Polls updates until Ctrl-C or a fatal polling error.
#[instrument(skip(bot, chain))]
pub async fn run_dispatcher(
    bot: teloxide::Bot,
    chain: HandlerChain,
    bot_username: String,
) -> DispatchOutcome {
    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(on_message))
        .branch(Update::filter_callback_query().endpoint(on_callback));

    let activity = PollActivity(Arc::new(AtomicBool::new(false)));
    let default_activity = activity.clone();
    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .dependencies(dptree::deps![
            chain,
            BotUsername(Arc::from(bot_username)),
            activity.clone()
        ])
        .default_handler(move |update| {
            let activity = default_activity.clone();
            async move {
                activity.mark();
                debug!(update_id = update.id.0, "Unhandled update kind");
            }
        })
        .enable_ctrlc_handler()
        .build();

    let fatal = Arc::new(AtomicBool::new(false));
    let shutdown = dispatcher.shutdown_token();
    let fatal_flag = fatal.clone();
    let error_handler = Arc::new(move |err: RequestError| {
        if is_fatal_polling_error(&err) {
            error!(error = %err, "Fatal polling error, stopping dispatcher");
            fatal_flag.store(true, Ordering::SeqCst);
            if shutdown.shutdown().is_err() {
                warn!("Dispatcher was not running when shutdown was requested");
            }
        } else {
            warn!(error = %err, "Transient polling error");
        }
        async {}
    });

    let listener = update_listeners::polling_default(bot).await;
    info!("Dispatcher started");
    dispatcher.dispatch_with_listener(listener, error_handler).await;

    if fatal.load(Ordering::SeqCst) {
        DispatchOutcome::Fatal {
            received_updates: activity.0.load(Ordering::Relaxed),
        }
    } else {
        DispatchOutcome::Stopped
    }
}

/// Feeds a dispatcher outcome into the policy. `None` means polling ended on request.
fn next_step(
    policy: &mut RestartPolicy,
    outcome: DispatchOutcome,
    now: Instant,
) -> Option<RestartDecision> {
    match outcome {
        DispatchOutcome::Stopped => None,
        DispatchOutcome::Fatal { received_updates } => {
            if received_updates {
                policy.record_success();
            }
            Some(policy.record_failure(now))
        }
    }
}

/// Runs the dispatcher, restarting it after fatal errors until the policy gives up.
pub async fn run_with_restarts(
    bot: teloxide::Bot,
    chain: HandlerChain,
    bot_username: String,
    mut policy: RestartPolicy,
) -> Result<()> {
    loop {
        let outcome = run_dispatcher(bot.clone(), chain.clone(), bot_username.clone()).await;
        match next_step(&mut policy, outcome, Instant::now()) {
            None => {
                info!("Dispatcher stopped");
                return Ok(());
            }
            Some(RestartDecision::Restart(delay)) => {
                warn!(
                    delay_secs = delay.as_secs(),
                    consecutive_failures = policy.consecutive_failures(),
                    "Restarting dispatcher"
                );
                tokio::time::sleep(delay).await;
            }
            Some(RestartDecision::GiveUp) => {
                error!(
                    consecutive_failures = policy.consecutive_failures(),
                    "Too many fatal polling errors, auto-restart disabled"
                );
                anyhow::bail!("polling stopped after repeated fatal errors");
            }
        }
    }
}
