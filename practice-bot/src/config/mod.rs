//! Bot configuration: BaseConfig (Telegram + log + DB) + PracticeConfig (admins, contacts, digest).

mod base;
mod bot_config;
mod practice;

#[cfg(test)]
mod tests;

pub use base::BaseConfig;
pub use bot_config::BotConfig;
pub use practice::{AppEnvironment, PracticeConfig};
