//! Handler response type for the handler chain.

/// Handler result for the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerResponse {
    /// Pass to next handler.
    Continue,
    /// Stop the chain; the event was consumed.
    Stop,
    /// Skip this handler, try next.
    Ignore,
}
