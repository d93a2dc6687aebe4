//! # Handler chain
//!
//! Runs a sequence of handlers for each inbound event: every `before` in order (any may stop
//! the chain), then `handle` until one returns Stop, then every `after` in reverse order.

use crate::core::{Event, Handler, HandlerResponse, Result};
use std::sync::Arc;
use tracing::{debug, info, instrument};

#[derive(Clone, Default)]
pub struct HandlerChain {
    handlers: Vec<Arc<dyn Handler>>,
}

impl HandlerChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Appends a handler (runs in order; first Stop ends the handle phase).
    pub fn add_handler(mut self, handler: Arc<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Runs before, handle and after phases. Returns the first Stop, or Continue.
    #[instrument(skip(self, event), fields(chat_id = event.chat.id, kind = event.kind_name()))]
    pub async fn handle(&self, event: &Event) -> Result<HandlerResponse> {
        let mut final_response = HandlerResponse::Continue;

        for handler in &self.handlers {
            if !handler.before(event).await? {
                let handler_name = std::any::type_name_of_val(handler.as_ref());
                info!(
                    chat_id = event.chat.id,
                    handler = %handler_name,
                    "step: handler before returned false, chain stopped"
                );
                return Ok(HandlerResponse::Stop);
            }
        }

        for handler in &self.handlers {
            let handler_name = std::any::type_name_of_val(handler.as_ref());
            let response = handler.handle(event).await?;
            debug!(
                handler = %handler_name,
                response = ?response,
                "Handler processed"
            );

            match response {
                HandlerResponse::Stop => {
                    final_response = response;
                    break;
                }
                HandlerResponse::Continue | HandlerResponse::Ignore => continue,
            }
        }

        for handler in self.handlers.iter().rev() {
            handler.after(event, &final_response).await?;
        }

        Ok(final_response)
    }
}
