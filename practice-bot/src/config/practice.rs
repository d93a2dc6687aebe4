//! Domain config: who the administrators are, what to tell students, when to send the digest.

use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Production,
}

impl AppEnvironment {
    /// `development`/`dev` → Development; anything else → Production.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => AppEnvironment::Development,
            _ => AppEnvironment::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PracticeConfig {
    /// ADMIN_CHAT_IDS, comma-separated.
    pub admin_chat_ids: Vec<i64>,
    /// SUPPORT_CONTACT
    pub support_contact: String,
    /// PRIVACY_POLICY_URL
    pub privacy_policy_url: String,
    /// APP_ENV; development surfaces error detail to users.
    pub environment: AppEnvironment,
    /// DIGEST_HOUR, local time, 0–23.
    pub digest_hour: u32,
}

impl Default for PracticeConfig {
    fn default() -> Self {
        Self {
            admin_chat_ids: Vec::new(),
            support_contact: "@practice_support".to_string(),
            privacy_policy_url: "https://example.org/privacy".to_string(),
            environment: AppEnvironment::Production,
            digest_hour: 9,
        }
    }
}

impl PracticeConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let admin_chat_ids = match env::var("ADMIN_CHAT_IDS") {
            Ok(raw) => parse_chat_ids(&raw)?,
            Err(_) => Vec::new(),
        };
        let support_contact = env::var("SUPPORT_CONTACT").unwrap_or(defaults.support_contact);
        let privacy_policy_url =
            env::var("PRIVACY_POLICY_URL").unwrap_or(defaults.privacy_policy_url);
        let environment = env::var("APP_ENV")
            .map(|v| AppEnvironment::parse(&v))
            .unwrap_or(defaults.environment);
        let digest_hour = match env::var("DIGEST_HOUR") {
            Ok(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("DIGEST_HOUR is not a number: {}", raw))?,
            Err(_) => defaults.digest_hour,
        };

        Ok(Self {
            admin_chat_ids,
            support_contact,
            privacy_policy_url,
            environment,
            digest_hour,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.digest_hour > 23 {
            anyhow::bail!("DIGEST_HOUR must be 0..=23, got {}", self.digest_hour);
        }
        if reqwest::Url::parse(&self.privacy_policy_url).is_err() {
            anyhow::bail!("PRIVACY_POLICY_URL is not a valid URL: {}", self.privacy_policy_url);
        }
        Ok(())
    }

    pub fn is_admin(&self, chat_id: i64) -> bool {
        self.admin_chat_ids.contains(&chat_id)
    }

    pub fn is_development(&self) -> bool {
        self.environment == AppEnvironment::Development
    }
}

/// Parses `"1, 2,3"`; blank entries are skipped, anything else non-numeric is an error.
pub(crate) fn parse_chat_ids(raw: &str) -> Result<Vec<i64>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<i64>()
                .with_context(|| format!("ADMIN_CHAT_IDS contains a non-numeric id: {}", s))
        })
        .collect()
}
