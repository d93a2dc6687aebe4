//! Chain handlers that sit around the conversation engine.

mod logging;

pub use logging::LoggingHandler;
