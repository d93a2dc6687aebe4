//! Bot abstraction for sending and editing messages.
//!
//! [`Bot`] is transport-agnostic; [`crate::telegram::TelegramBotAdapter`] implements it via
//! teloxide and tests substitute a recording double.

use crate::core::error::{Result, TransportError};
use crate::core::types::OutgoingMessage;
use async_trait::async_trait;

/// Outbound side of the chat transport. Message ids are transport-specific strings.
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a message (with optional keyboard) and returns its id.
    async fn send(&self, chat_id: i64, message: &OutgoingMessage) -> Result<String>;
    /// Replaces the text (and inline keyboard, if any) of an already-sent message.
    async fn edit(&self, chat_id: i64, message_id: &str, message: &OutgoingMessage) -> Result<()>;
    /// Removes the inline keyboard of an already-sent message.
    async fn remove_keyboard(&self, chat_id: i64, message_id: &str) -> Result<()>;
    /// Shows the "typing…" indicator.
    async fn send_typing(&self, chat_id: i64) -> Result<()>;
    /// Bot's own username (`getMe`), if it has one.
    async fn username(&self) -> Result<Option<String>>;

    /// Sends plain text without a keyboard.
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<String> {
        self.send(chat_id, &OutgoingMessage::plain(text)).await
    }
}

/// Parses a message id string into an i32. Used by edit operations.
pub fn parse_message_id(s: &str) -> Result<i32> {
    s.parse::<i32>()
        .map_err(|_| TransportError::InvalidMessageId(s.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_message_id_valid() {
        assert_eq!(parse_message_id("123").unwrap(), 123);
        assert_eq!(parse_message_id("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_message_id_invalid() {
        assert!(parse_message_id("").is_err());
        assert!(parse_message_id("abc").is_err());
        assert!(parse_message_id("12.3").is_err());
    }
}
