//! Inbound event: what a chat sent us, already decoded at the transport boundary.

use chrono::{DateTime, Utc};

use super::{callback::CallbackAction, chat::Chat, user::User};
use crate::core::command::Command;

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    /// Recognised slash-command.
    Command(Command),
    /// Free text, including persistent-keyboard labels.
    Text(String),
    /// Inline-button press. `message_id` is the message carrying the keyboard.
    Callback {
        action: CallbackAction,
        message_id: Option<String>,
    },
}

#[derive(Debug, Clone)]
pub struct Event {
    pub id: String,
    pub user: User,
    pub chat: Chat,
    pub kind: EventKind,
    pub created_at: DateTime<Utc>,
}

impl Event {
    pub fn new(id: impl Into<String>, user: User, chat: Chat, kind: EventKind) -> Self {
        Self {
            id: id.into(),
            user,
            chat,
            kind,
            created_at: Utc::now(),
        }
    }

    pub fn chat_id(&self) -> i64 {
        self.chat.id
    }

    /// Short label for logs.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            EventKind::Command(_) => "command",
            EventKind::Text(_) => "text",
            EventKind::Callback { .. } => "callback",
        }
    }
}
