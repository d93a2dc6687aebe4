//! Adapters from Telegram (teloxide) updates to core events.
//!
//! Commands, free text and callback payloads are all decoded here, so the conversation engine
//! only ever sees [`EventKind`] values.

use crate::core::{CallbackAction, Chat, Command, Event, EventKind, ToCoreEvent, ToCoreUser, User};

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Builds the event for an inbound text message: a command if it parses as one, text otherwise.
pub fn message_event(
    id: String,
    user: User,
    chat: Chat,
    text: &str,
    bot_username: &str,
) -> Option<Event> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let kind = match Command::parse_text(text, bot_username) {
        Some(command) => EventKind::Command(command),
        None => EventKind::Text(text.to_string()),
    };
    Some(Event::new(id, user, chat, kind))
}

/// Builds the event for a button press. Unknown payloads yield `None`.
pub fn callback_event(
    id: String,
    user: User,
    chat: Chat,
    data: &str,
    message_id: Option<String>,
) -> Option<Event> {
    let action = CallbackAction::decode(data)?;
    Some(Event::new(id, user, chat, EventKind::Callback { action, message_id }))
}

fn core_chat(chat: &teloxide::types::Chat) -> Chat {
    Chat {
        id: chat.id.0,
        chat_type: if chat.is_private() {
            "private".to_string()
        } else {
            "group".to_string()
        },
    }
}

/// Wraps a teloxide Message. Only text messages from a user become events.
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreEvent for TelegramMessageWrapper<'a> {
    fn to_event(&self, bot_username: &str) -> Option<Event> {
        let user = TelegramUserWrapper(self.0.from.as_ref()?).to_core();
        let text = self.0.text()?;
        message_event(
            self.0.id.to_string(),
            user,
            core_chat(&self.0.chat),
            text,
            bot_username,
        )
    }
}

/// Wraps a teloxide CallbackQuery. Presses on messages the bot can no longer see still carry
/// the chat, so they are delivered; presses without any message are dropped.
pub struct TelegramCallbackWrapper<'a>(pub &'a teloxide::types::CallbackQuery);

impl<'a> ToCoreEvent for TelegramCallbackWrapper<'a> {
    fn to_event(&self, _bot_username: &str) -> Option<Event> {
        let message = self.0.message.as_ref()?;
        let data = self.0.data.as_deref()?;
        let chat = core_chat(message.chat());
        let message_id = message.id().to_string();
        callback_event(
            format!("cb:{}:{}", chat.id, message_id),
            TelegramUserWrapper(&self.0.from).to_core(),
            chat,
            data,
            Some(message_id),
        )
    }
}
