//! Recording implementation of [`practice_bot::Bot`] for integration tests.
//!
//! Every send, edit and keyboard removal is kept so tests can assert on what each chat saw
//! without hitting Telegram. Chats marked as blocked fail like a user who blocked the bot.

use async_trait::async_trait;
use practice_bot::{Bot, Keyboard, OutgoingMessage, Result, TransportError};
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// One recorded outbound message.
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub chat_id: i64,
    pub message_id: String,
    pub message: OutgoingMessage,
}

#[derive(Default)]
pub struct RecordingBot {
    next_id: AtomicU64,
    sent: Mutex<Vec<SentRecord>>,
    edits: Mutex<Vec<(i64, String, OutgoingMessage)>>,
    removed_keyboards: Mutex<Vec<(i64, String)>>,
    blocked: Mutex<HashSet<i64>>,
}

#[allow(dead_code)]
impl RecordingBot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn block(&self, chat_id: i64) {
        self.blocked.lock().unwrap().insert(chat_id);
    }

    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, chat_id: i64) -> Vec<SentRecord> {
        self.sent()
            .into_iter()
            .filter(|r| r.chat_id == chat_id)
            .collect()
    }

    /// Texts sent to `chat_id`, oldest first.
    pub fn texts(&self, chat_id: i64) -> Vec<String> {
        self.sent_to(chat_id)
            .into_iter()
            .map(|r| r.message.text)
            .collect()
    }

    pub fn last_to(&self, chat_id: i64) -> Option<SentRecord> {
        self.sent_to(chat_id).pop()
    }

    pub fn last_text(&self, chat_id: i64) -> String {
        self.last_to(chat_id)
            .map(|r| r.message.text)
            .unwrap_or_default()
    }

    pub fn last_keyboard(&self, chat_id: i64) -> Option<Keyboard> {
        self.last_to(chat_id).and_then(|r| r.message.keyboard)
    }

    pub fn count_to(&self, chat_id: i64) -> usize {
        self.sent_to(chat_id).len()
    }

    pub fn edits(&self) -> Vec<(i64, String, OutgoingMessage)> {
        self.edits.lock().unwrap().clone()
    }

    pub fn removed_keyboards(&self) -> Vec<(i64, String)> {
        self.removed_keyboards.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.sent.lock().unwrap().clear();
        self.edits.lock().unwrap().clear();
        self.removed_keyboards.lock().unwrap().clear();
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn send(&self, chat_id: i64, message: &OutgoingMessage) -> Result<String> {
        if self.blocked.lock().unwrap().contains(&chat_id) {
            return Err(TransportError::Blocked("Forbidden: bot was blocked by the user".into()).into());
        }
        let message_id = (self.next_id.fetch_add(1, Ordering::SeqCst) + 1).to_string();
        self.sent.lock().unwrap().push(SentRecord {
            chat_id,
            message_id: message_id.clone(),
            message: message.clone(),
        });
        Ok(message_id)
    }

    async fn edit(&self, chat_id: i64, message_id: &str, message: &OutgoingMessage) -> Result<()> {
        self.edits
            .lock()
            .unwrap()
            .push((chat_id, message_id.to_string(), message.clone()));
        Ok(())
    }

    async fn remove_keyboard(&self, chat_id: i64, message_id: &str) -> Result<()> {
        self.removed_keyboards
            .lock()
            .unwrap()
            .push((chat_id, message_id.to_string()));
        Ok(())
    }

    async fn send_typing(&self, _chat_id: i64) -> Result<()> {
        Ok(())
    }

    async fn username(&self) -> Result<Option<String>> {
        Ok(Some("practicebot".to_string()))
    }
}
