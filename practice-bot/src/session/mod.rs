//! Per-chat conversation sessions (in memory, lost on restart) and the per-chat locks that keep
//! one event per chat in flight.

mod locks;
mod store;

pub use locks::ChatLocks;
pub use store::{InMemorySessionStore, SessionStore};
