//! Wraps teloxide::Bot and implements [`crate::core::Bot`]. Production code sends messages via
//! Telegram; tests substitute a recording double.

use crate::core::{
    parse_message_id, Bot as CoreBot, Keyboard, OutgoingMessage, Result, TextFormat,
    TransportError,
};
use async_trait::async_trait;
use teloxide::payloads::{EditMessageTextSetters, SendMessageSetters};
use teloxide::prelude::*;
use teloxide::types::{
    ChatAction, ChatId, InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
    KeyboardMarkup, KeyboardRemove, MessageId, ParseMode, ReplyMarkup,
};
use teloxide::{ApiError, RequestError};

/// Thin wrapper around teloxide::Bot that implements core's Bot trait.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

/// Sorts teloxide failures into the three cases callers act on: the recipient is gone,
/// the network hiccupped, or the API refused the request.
pub fn classify_request_error(error: RequestError) -> TransportError {
    match &error {
        RequestError::Api(
            ApiError::BotBlocked
            | ApiError::BotKicked
            | ApiError::BotKickedFromSupergroup
            | ApiError::UserDeactivated
            | ApiError::ChatNotFound
            | ApiError::CantInitiateConversation,
        ) => TransportError::Blocked(error.to_string()),
        RequestError::Network(_) | RequestError::Io(_) | RequestError::RetryAfter(_) => {
            TransportError::Transient(error.to_string())
        }
        _ => TransportError::Api(error.to_string()),
    }
}

fn inline_markup(rows: &[Vec<crate::core::InlineButton>]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(rows.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.text.clone(), button.action.encode()))
            .collect::<Vec<_>>()
    }))
}

fn reply_markup(keyboard: &Keyboard) -> ReplyMarkup {
    match keyboard {
        Keyboard::Inline(rows) => ReplyMarkup::InlineKeyboard(inline_markup(rows)),
        Keyboard::Reply(rows) => ReplyMarkup::Keyboard(
            KeyboardMarkup::new(rows.iter().map(|row| {
                row.iter()
                    .map(|label| KeyboardButton::new(label.clone()))
                    .collect::<Vec<_>>()
            }))
            .resize_keyboard(),
        ),
        Keyboard::Remove => ReplyMarkup::KeyboardRemove(KeyboardRemove::new()),
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send(&self, chat_id: i64, message: &OutgoingMessage) -> Result<String> {
        let mut request = self.bot.send_message(ChatId(chat_id), message.text.clone());
        if message.format == TextFormat::MarkdownV2 {
            request = request.parse_mode(ParseMode::MarkdownV2);
        }
        if let Some(keyboard) = &message.keyboard {
            request = request.reply_markup(reply_markup(keyboard));
        }
        let sent = request.await.map_err(classify_request_error)?;
        Ok(sent.id.to_string())
    }

    async fn edit(&self, chat_id: i64, message_id: &str, message: &OutgoingMessage) -> Result<()> {
        let id = parse_message_id(message_id)?;
        let mut request =
            self.bot
                .edit_message_text(ChatId(chat_id), MessageId(id), message.text.clone());
        if message.format == TextFormat::MarkdownV2 {
            request = request.parse_mode(ParseMode::MarkdownV2);
        }
        if let Some(Keyboard::Inline(rows)) = &message.keyboard {
            request = request.reply_markup(inline_markup(rows));
        }
        match request.await {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(classify_request_error(e).into()),
        }
    }

    async fn remove_keyboard(&self, chat_id: i64, message_id: &str) -> Result<()> {
        let id = parse_message_id(message_id)?;
        match self
            .bot
            .edit_message_reply_markup(ChatId(chat_id), MessageId(id))
            .await
        {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(classify_request_error(e).into()),
        }
    }

    async fn send_typing(&self, chat_id: i64) -> Result<()> {
        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(classify_request_error)?;
        Ok(())
    }

    async fn username(&self) -> Result<Option<String>> {
        let me = self.bot.get_me().await.map_err(classify_request_error)?;
        Ok(me.user.username.clone())
    }
}
