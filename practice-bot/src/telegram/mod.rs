//! Telegram transport: teloxide adapters, the [`crate::core::Bot`] implementation, the update
//! dispatcher and its restart policy.

mod adapters;
mod bot_adapter;
mod restart;
mod runner;

pub use adapters::{
    callback_event, message_event, TelegramCallbackWrapper, TelegramMessageWrapper,
    TelegramUserWrapper,
};
pub use bot_adapter::{classify_request_error, TelegramBotAdapter};
pub use restart::{is_fatal_polling_error, RestartDecision, RestartPolicy};
pub use runner::{run_dispatcher, run_with_restarts, DispatchOutcome};
