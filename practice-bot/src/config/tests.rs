//! Config tests.

use crate::config::practice::parse_chat_ids;
use crate::config::{AppEnvironment, BotConfig};
use serial_test::serial;
use std::env;

const VARS: &[&str] = &[
    "BOT_TOKEN",
    "DATABASE_URL",
    "LOG_FILE",
    "TELEGRAM_API_URL",
    "TELOXIDE_API_URL",
    "ADMIN_CHAT_IDS",
    "SUPPORT_CONTACT",
    "PRIVACY_POLICY_URL",
    "APP_ENV",
    "DIGEST_HOUR",
];

fn clear_env() {
    for var in VARS {
        env::remove_var(var);
    }
}

#[test]
#[serial]
fn test_load_config_with_defaults() {
    clear_env();
    env::set_var("BOT_TOKEN", "test_token");

    let config = BotConfig::load(None).unwrap();

    assert_eq!(config.bot_token(), "test_token");
    assert!(config.telegram_api_url().is_none());
    assert_eq!(config.database_url(), "sqlite:./practice_bot.db");
    assert_eq!(config.log_file(), "logs/practice-bot.log");
    let practice = config.practice();
    assert!(practice.admin_chat_ids.is_empty());
    assert_eq!(practice.support_contact, "@practice_support");
    assert_eq!(practice.environment, AppEnvironment::Production);
    assert_eq!(practice.digest_hour, 9);
    config.validate().unwrap();
}

#[test]
#[serial]
fn test_load_config_with_custom_values() {
    clear_env();
    env::set_var("BOT_TOKEN", "custom_token");
    env::set_var("DATABASE_URL", "sqlite::memory:");
    env::set_var("ADMIN_CHAT_IDS", "111, 222,,333");
    env::set_var("SUPPORT_CONTACT", "+7 900 000-00-00");
    env::set_var("PRIVACY_POLICY_URL", "https://practice.example.org/privacy");
    env::set_var("APP_ENV", "development");
    env::set_var("DIGEST_HOUR", "18");

    let config = BotConfig::load(None).unwrap();

    assert_eq!(config.database_url(), "sqlite::memory:");
    let practice = config.practice();
    assert_eq!(practice.admin_chat_ids, vec![111, 222, 333]);
    assert!(practice.is_admin(222));
    assert!(!practice.is_admin(444));
    assert_eq!(practice.support_contact, "+7 900 000-00-00");
    assert!(practice.is_development());
    assert_eq!(practice.digest_hour, 18);
    config.validate().unwrap();
}

#[test]
#[serial]
fn test_load_config_with_override_token() {
    clear_env();
    env::set_var("BOT_TOKEN", "env_token");

    let config = BotConfig::load(Some("override_token".to_string())).unwrap();

    assert_eq!(config.bot_token(), "override_token");
}

#[test]
#[serial]
fn test_missing_token_is_an_error() {
    clear_env();
    assert!(BotConfig::load(None).is_err());
}

#[test]
#[serial]
fn test_validate_rejects_bad_values() {
    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("DIGEST_HOUR", "24");
    assert!(BotConfig::load(None).unwrap().validate().is_err());

    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("TELEGRAM_API_URL", "not a url");
    assert!(BotConfig::load(None).unwrap().validate().is_err());

    clear_env();
    env::set_var("BOT_TOKEN", "t");
    env::set_var("ADMIN_CHAT_IDS", "1,abc");
    assert!(BotConfig::load(None).is_err());
}

#[test]
fn test_parse_chat_ids() {
    assert_eq!(parse_chat_ids("").unwrap(), Vec::<i64>::new());
    assert_eq!(parse_chat_ids(" -100123 , 5").unwrap(), vec![-100123, 5]);
    assert!(parse_chat_ids("1;2").is_err());
}

#[test]
fn test_app_environment_parse() {
    assert_eq!(AppEnvironment::parse("DEV"), AppEnvironment::Development);
    assert_eq!(AppEnvironment::parse("staging"), AppEnvironment::Production);
}
