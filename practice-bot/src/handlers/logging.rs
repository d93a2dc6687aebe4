//! Logs each inbound event in before() and the chain's response in after(); always continues.

use async_trait::async_trait;
use tracing::{debug, info, instrument};

use crate::core::{Event, EventKind, Handler, HandlerResponse, Result};

pub struct LoggingHandler;

#[async_trait]
impl Handler for LoggingHandler {
    #[instrument(skip(self, event))]
    async fn before(&self, event: &Event) -> Result<bool> {
        match &event.kind {
            EventKind::Command(command) => info!(
                user_id = event.user.id,
                chat_id = event.chat.id,
                username = %event.user.username.as_deref().unwrap_or("unknown"),
                command = ?command,
                "Received command"
            ),
            // Free text may carry personal data; only its length is logged.
            EventKind::Text(text) => info!(
                user_id = event.user.id,
                chat_id = event.chat.id,
                username = %event.user.username.as_deref().unwrap_or("unknown"),
                text_len = text.chars().count(),
                "Received text"
            ),
            EventKind::Callback { action, message_id } => info!(
                user_id = event.user.id,
                chat_id = event.chat.id,
                action = %action.encode(),
                message_id = ?message_id,
                "Received button press"
            ),
        }
        Ok(true)
    }

    #[instrument(skip(self, event, response))]
    async fn after(&self, event: &Event, response: &HandlerResponse) -> Result<()> {
        debug!(
            event_id = %event.id,
            chat_id = event.chat.id,
            response = ?response,
            "Processed event"
        );
        Ok(())
    }
}
