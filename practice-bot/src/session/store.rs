//! Session repository keyed by chat id.

use async_trait::async_trait;
use dashmap::DashMap;

use crate::conversation::Session;

/// Where sessions live. The engine only reads and writes them while holding the chat's lock.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: i64) -> Option<Session>;
    async fn set(&self, chat_id: i64, session: Session);
    /// Returns true if a session existed.
    async fn delete(&self, chat_id: i64) -> bool;
}

/// Process-wide map. Sessions never expire on their own.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<i64, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat_id: i64) -> Option<Session> {
        self.sessions.get(&chat_id).map(|entry| entry.value().clone())
    }

    async fn set(&self, chat_id: i64, session: Session) {
        self.sessions.insert(chat_id, session);
    }

    async fn delete(&self, chat_id: i64) -> bool {
        self.sessions.remove(&chat_id).is_some()
    }
}
