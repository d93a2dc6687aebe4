//! CLI parser and config loading.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::config::BotConfig;

#[derive(Parser)]
#[command(name = "practice-bot")]
#[command(about = "Telegram bot for internship applications, tasks and reminders", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the Telegram bot (config from env; token can override BOT_TOKEN).
    Run {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Send today's practice reminders and admin digest once, then exit.
    Digest {
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Create the database schema and exit.
    InitDb {
        #[arg(short, long)]
        token: Option<String>,
    },
}

/// Load BotConfig from environment. If `token` is provided it overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> Result<BotConfig> {
    BotConfig::load(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: `run --token` parses into the Run subcommand with the token.**
    #[test]
    fn test_parse_run_with_token() {
        let cli = Cli::try_parse_from(["practice-bot", "run", "--token", "abc"]).unwrap();
        match cli.command {
            Commands::Run { token } => assert_eq!(token.as_deref(), Some("abc")),
            _ => panic!("expected run"),
        }
    }

    /// **Test: maintenance subcommands parse without arguments.**
    #[test]
    fn test_parse_digest_and_init_db() {
        let cli = Cli::try_parse_from(["practice-bot", "digest"]).unwrap();
        assert!(matches!(cli.command, Commands::Digest { token: None }));
        let cli = Cli::try_parse_from(["practice-bot", "init-db"]).unwrap();
        assert!(matches!(cli.command, Commands::InitDb { token: None }));
    }
}
