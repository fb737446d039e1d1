/// Known Accounts Importer
///
/// Adds account display names from a JSON file to the `known_accounts` table.
use anyhow::{Context, Result};
use clap::Parser;
use std::env;

use nano_ledger_crawler::cli::KnownAccountsCli;
use nano_ledger_crawler::db::Database;
use nano_ledger_crawler::known_accounts::{load_entries, usable_entries};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = KnownAccountsCli::parse();

    tracing_subscriber::fmt().with_env_filter(nano_ledger_crawler::log_filter(cli.sql_echo)).init();

    let database_url = match &cli.database_url {
        Some(url) => url.clone(),
        None => env::var("DATABASE_URL").context("DATABASE_URL not found in environment. Please check your .env file")?,
    };

    let database = Database::new(&database_url, 1).await.context("Failed to connect to PostgreSQL database")?;
    database.migrate().await.context("Failed to run database migrations")?;

    let entries = usable_entries(load_entries(&cli.file_path).await?);
    let existed = database.upsert_known_accounts(&entries).await.context("Failed to store known accounts")?;

    for ((account, alias), was_known) in entries.iter().zip(existed) {
        if was_known {
            println!("Account {} ({}) already exists, updated", account, alias);
        } else {
            println!("Added account {} ({})", account, alias);
        }
    }

    tracing::info!("Imported {} known accounts", entries.len());
    Ok(())
}
