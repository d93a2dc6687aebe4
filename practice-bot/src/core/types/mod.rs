//! Core model: user, chat, inbound event, outbound message, callback payloads, handler contract.

mod callback;
mod chat;
mod event;
mod handler;
mod outgoing;
mod response;
mod user;

pub use callback::{CallbackAction, EditField};
pub use chat::Chat;
pub use event::{Event, EventKind};
pub use handler::{Handler, ToCoreEvent, ToCoreUser};
pub use outgoing::{InlineButton, Keyboard, OutgoingMessage, TextFormat};
pub use response::HandlerResponse;
pub use user::User;
