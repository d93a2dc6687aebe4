//! Notification dispatcher: delivers prepared messages to one or many chats.
//!
//! Delivery never fails past this boundary in the sense of aborting the caller: every recipient
//! gets its own `Result`, and the caller decides what partial failure means.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::{Bot, OutgoingMessage, Result};

/// Outcome of one recipient in a fan-out.
#[derive(Debug)]
pub struct Delivery {
    pub chat_id: i64,
    pub result: Result<String>,
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

#[derive(Clone)]
pub struct Notifier {
    bot: Arc<dyn Bot>,
}

impl Notifier {
    pub fn new(bot: Arc<dyn Bot>) -> Self {
        Self { bot }
    }

    /// Sends one message. Blocked recipients are expected and only logged at debug.
    pub async fn notify(&self, chat_id: i64, message: &OutgoingMessage) -> Result<String> {
        match self.bot.send(chat_id, message).await {
            Ok(message_id) => Ok(message_id),
            Err(e) if e.is_blocked() => {
                debug!(chat_id, error = %e, "Recipient unreachable, notification skipped");
                Err(e)
            }
            Err(e) => {
                warn!(chat_id, error = %e, "Notification delivery failed");
                Err(e)
            }
        }
    }

    /// Sends to every recipient in order; one failure does not stop the rest.
    pub async fn notify_many(&self, chat_ids: &[i64], message: &OutgoingMessage) -> Vec<Delivery> {
        let mut deliveries = Vec::with_capacity(chat_ids.len());
        for &chat_id in chat_ids {
            let result = self.notify(chat_id, message).await;
            deliveries.push(Delivery { chat_id, result });
        }
        let delivered = deliveries.iter().filter(|d| d.is_delivered()).count();
        info!(
            recipients = chat_ids.len(),
            delivered,
            "Notification fan-out finished"
        );
        deliveries
    }
}
