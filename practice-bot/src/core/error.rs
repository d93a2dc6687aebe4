use storage::StorageError;
use thiserror::Error;

/// Everything a handler can fail with.
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),
}

impl BotError {
    /// True when delivery failed because the recipient blocked the bot or left.
    pub fn is_blocked(&self) -> bool {
        matches!(self, BotError::Transport(TransportError::Blocked(_)))
    }
}

/// Outbound delivery failures, classified at the transport boundary.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Recipient unreachable: {0}")]
    Blocked(String),

    #[error("Transient failure: {0}")]
    Transient(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid message_id: {0}")]
    InvalidMessageId(String),
}

/// A flow reached a point its session should have made impossible.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("Incomplete draft: missing {0}")]
    IncompleteDraft(&'static str),
}

pub type Result<T> = std::result::Result<T, BotError>;
