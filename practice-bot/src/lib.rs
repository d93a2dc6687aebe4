//! # Practice bot
//!
//! Telegram front-end for internship management: students apply and edit applications,
//! administrators moderate them and hand out tasks, students submit solutions, and a daily job
//! sends reminders and a summary.
//!
//! Core (Handler, Bot, Event), chain (HandlerChain) and telegram (dispatcher, adapters) are
//! transport plumbing; `conversation` holds the flows.

pub mod chain;
pub mod cli;
pub mod components;
pub mod config;
pub mod conversation;
pub mod core;
pub mod digest;
pub mod handlers;
pub mod notify;
pub mod runner;
pub mod session;
pub mod telegram;

pub use cli::{load_config, Cli, Commands};

pub use crate::core::{
    init_tracing, parse_message_id, Bot, BotError, CallbackAction, Chat, Command, Event,
    EventKind, Handler, HandlerError, HandlerResponse, Keyboard, OutgoingMessage, Result,
    TextFormat, ToCoreEvent, ToCoreUser, TransportError, User,
};

pub use chain::HandlerChain;

pub use telegram::{
    run_dispatcher, run_with_restarts, RestartPolicy, TelegramBotAdapter, TelegramCallbackWrapper,
    TelegramMessageWrapper, TelegramUserWrapper,
};

pub use config::{AppEnvironment, BaseConfig, BotConfig, PracticeConfig};
pub use conversation::ConversationEngine;
pub use digest::{DigestJob, DigestReport};
pub use handlers::LoggingHandler;
pub use notify::{Delivery, Notifier};
pub use runner::{init_database, run_bot, run_digest_once};
pub use session::{ChatLocks, InMemorySessionStore, SessionStore};

pub use components::{build_bot_components, build_handler_chain, BotComponents};
