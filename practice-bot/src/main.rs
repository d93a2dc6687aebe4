//! practice-bot binary: run the bot, send the digest once, or initialize the database.

use anyhow::Result;
use clap::Parser;
use practice_bot::{init_database, load_config, run_bot, run_digest_once, Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { token } => run_bot(load_config(token)?).await,
        Commands::Digest { token } => {
            let report = run_digest_once(load_config(token)?).await?;
            println!(
                "reminders sent: {}, admin deliveries: {}",
                report
                    .reminders_sent
                    .map_or_else(|| "failed".to_string(), |n| n.to_string()),
                report
                    .admin_deliveries
                    .map_or_else(|| "failed".to_string(), |n| n.to_string()),
            );
            Ok(())
        }
        Commands::InitDb { token } => init_database(load_config(token)?).await,
    }
}
