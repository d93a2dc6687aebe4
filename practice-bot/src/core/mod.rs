//! Core types and traits: Handler, Bot, Event, HandlerResponse, commands, callbacks, error, logger.
//! Transport-agnostic apart from the command parser, which reuses teloxide's `BotCommands`.

pub mod bot;
pub mod command;
pub mod error;
pub mod logger;
pub mod types;

pub use bot::{parse_message_id, Bot};
pub use command::Command;
pub use error::{BotError, HandlerError, Result, TransportError};
pub use logger::init_tracing;
pub use types::{
    CallbackAction, Chat, EditField, Event, EventKind, Handler, HandlerResponse, InlineButton,
    Keyboard, OutgoingMessage, TextFormat, ToCoreEvent, ToCoreUser, User,
};
