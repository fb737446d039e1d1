/// Nano Ledger Crawler
///
/// Crawls every account's history on a Nano node and loads confirmed transactions into PostgreSQL.
use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::sync::Arc;

use nano_ledger_crawler::checkpoint::CheckpointFile;
use nano_ledger_crawler::cli::Cli;
use nano_ledger_crawler::context::CrawlContext;
use nano_ledger_crawler::db::Database;
use nano_ledger_crawler::models::Account;
use nano_ledger_crawler::pipeline::Pipeline;
use nano_ledger_crawler::rpc::{LedgerRpc, NanoRpcClient};

const DEFAULT_RPC_URL: &str = "http://localhost:7076";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    cli.validate()?;

    // Initialize logging
    tracing_subscriber::fmt().with_env_filter(nano_ledger_crawler::log_filter(cli.sql_echo)).init();

    println!("🚀 Starting Nano Ledger Crawler...");

    let rpc_url = cli
        .rpc_node
        .clone()
        .or_else(|| env::var("NANO_RPC_URL").ok())
        .unwrap_or_else(|| DEFAULT_RPC_URL.to_string());

    // Initialize RPC client
    let rpc_client = NanoRpcClient::new(rpc_url, cli.rpc_timeout()).context("Failed to create RPC client")?;

    // Test RPC connection
    let version = rpc_client.version().await.context("Failed to connect to node RPC")?;
    println!("✅ Connected to: {} ({})", rpc_client.endpoint(), version.node_vendor);

    // Initialize database connection
    let database_url = match &cli.database_url {
        Some(url) => url.clone(),
        None => env::var("DATABASE_URL").context("DATABASE_URL not found in environment. Please check your .env file")?,
    };

    println!("\n💾 Connecting to PostgreSQL database...");
    let database =
        Database::new(&database_url, cli.db_connections).await.context("Failed to connect to PostgreSQL database")?;
    database.test_connection().await.context("Database connection test failed")?;

    println!("📋 Running database migrations...");
    database.migrate().await.context("Failed to run database migrations")?;
    println!("✅ Database ready!");

    let checkpoint = cli.checkpoint_file.as_ref().map(CheckpointFile::new);
    let start = resolve_start(&cli, checkpoint.as_ref()).await?;

    // Ctrl-C stops discovery; in-flight crawls finish their current page
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\n🛑 Shutdown requested, waiting for in-flight accounts...");
            shutdown_tx.send(true).ok();
        }
    });

    let ctx = Arc::new(CrawlContext::new(rpc_client, database, cli.crawl_settings(), shutdown_rx));

    let mut pipeline = Pipeline::new(ctx, start);
    if let Some(checkpoint) = checkpoint {
        pipeline = pipeline.with_checkpoint(checkpoint);
    }

    let stats = pipeline.run().await.context("Crawl failed")?;
    tracing::info!(
        "Crawl finished: {} accounts, {} transactions",
        stats.accounts_processed,
        stats.transactions_ingested
    );

    println!("\n✨ Done!");

    Ok(())
}

/// The explicit start account wins, then a stored checkpoint, then the zero account
async fn resolve_start(cli: &Cli, checkpoint: Option<&CheckpointFile>) -> Result<Account> {
    if let Some(start) = &cli.start_account {
        return Ok(Account::parse(start)?);
    }

    if let Some(checkpoint) = checkpoint {
        if let Some(account) = checkpoint.load().await? {
            println!("📍 Resuming from checkpoint {}: {}", checkpoint.path().display(), account);
            return Ok(account);
        }
    }

    Ok(Account::zero())
}
