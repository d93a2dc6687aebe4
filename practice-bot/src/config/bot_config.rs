//! BotConfig: BaseConfig + PracticeConfig. Use load() for env-based loading.

use anyhow::Result;

use super::{BaseConfig, PracticeConfig};

pub struct BotConfig {
    pub base: BaseConfig,
    pub practice: PracticeConfig,
}

impl BotConfig {
    /// Load full config from environment variables. If `token` is provided it overrides BOT_TOKEN.
    /// Call validate() after load to check config before init.
    pub fn load(token: Option<String>) -> Result<Self> {
        let base = BaseConfig::load(token)?;
        let practice = PracticeConfig::from_env()?;
        Ok(Self { base, practice })
    }

    /// Validate config. Call after load() to fail fast before init.
    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        self.practice.validate()
    }

    pub fn base(&self) -> &BaseConfig {
        &self.base
    }
    pub fn practice(&self) -> &PracticeConfig {
        &self.practice
    }

    pub fn bot_token(&self) -> &str {
        &self.base.bot_token
    }
    pub fn database_url(&self) -> &str {
        &self.base.database_url
    }
    pub fn log_file(&self) -> &str {
        &self.base.log_file
    }
    pub fn telegram_api_url(&self) -> Option<&str> {
        self.base.telegram_api_url.as_deref()
    }
}
