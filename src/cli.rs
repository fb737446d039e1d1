/// CLI Module
///
/// Command-line interface configuration using clap.
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::context::CrawlSettings;
use crate::models::{Account, Direction};
use crate::retry::RetryPolicy;

/// Nano Ledger Crawler
///
/// Walk every account on a Nano node and load confirmed transactions into PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "nano-ledger-crawler")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Node RPC address (overrides NANO_RPC_URL env var)
    #[arg(long, value_name = "URL")]
    pub rpc_node: Option<String>,

    /// Database connection URL (overrides DATABASE_URL env var)
    #[arg(short = 'd', long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Number of parallel account crawls
    #[arg(short = 'p', long, value_name = "COUNT", default_value = "64")]
    pub parallelism: usize,

    /// Pause discovery while more than this many account crawls are awaiting results
    #[arg(long, value_name = "COUNT", default_value = "4096")]
    pub awaiting_max: usize,

    /// Accounts requested per ledger page
    #[arg(short = 'b', long, value_name = "SIZE", default_value = "4096")]
    pub batch_size: usize,

    /// Entries requested per account history page
    #[arg(long, value_name = "SIZE", default_value = "4096")]
    pub history_batch_size: usize,

    /// Per-request RPC timeout in seconds
    #[arg(long, value_name = "SECONDS", default_value = "15")]
    pub rpc_timeout: u64,

    /// Account to start the ledger walk after (defaults to the checkpoint, then the zero account)
    #[arg(short = 's', long, value_name = "ACCOUNT")]
    pub start_account: Option<String>,

    /// Walk account histories oldest-first
    #[arg(long)]
    pub bottom_up: bool,

    /// Maximum number of attempts per RPC request
    #[arg(long, value_name = "COUNT", default_value = "60")]
    pub max_retries: usize,

    /// Delay between RPC attempts in seconds
    #[arg(long, value_name = "SECONDS", default_value = "1")]
    pub retry_delay: u64,

    /// Database connection pool size
    #[arg(long, value_name = "COUNT", default_value = "16")]
    pub db_connections: u32,

    /// Seconds between progress lines while waiting on workers
    #[arg(long, value_name = "SECONDS", default_value = "1")]
    pub progress_interval: u64,

    /// File recording the resume point of the ledger walk
    #[arg(long, value_name = "PATH")]
    pub checkpoint_file: Option<PathBuf>,

    /// Log every SQL statement
    #[arg(long)]
    pub sql_echo: bool,
}

impl Cli {
    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.batch_size == 0 || self.history_batch_size == 0 {
            anyhow::bail!("Batch sizes must be greater than 0");
        }

        if self.parallelism == 0 {
            anyhow::bail!("Parallelism must be greater than 0");
        }

        if self.max_retries == 0 {
            anyhow::bail!("Max retries must be greater than 0");
        }

        if self.db_connections == 0 {
            anyhow::bail!("Database pool must allow at least one connection");
        }

        if let Some(start) = &self.start_account {
            Account::parse(start)?;
        }

        Ok(())
    }

    pub fn direction(&self) -> Direction {
        if self.bottom_up {
            Direction::OldestFirst
        } else {
            Direction::NewestFirst
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout)
    }

    /// Crawl tuning derived from the arguments
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            ledger_page_size: self.batch_size,
            history_page_size: self.history_batch_size,
            direction: self.direction(),
            workers: self.parallelism,
            max_outstanding: self.awaiting_max,
            retry: RetryPolicy::new(self.max_retries, Duration::from_secs(self.retry_delay)),
            progress_interval: Duration::from_secs(self.progress_interval.max(1)),
        }
    }
}

/// Known Accounts Importer
///
/// Load account display names from a JSON file into PostgreSQL
#[derive(Parser, Debug)]
#[command(name = "known-accounts")]
#[command(author, version, about, long_about = None)]
pub struct KnownAccountsCli {
    /// Path to the known accounts JSON file
    #[arg(value_name = "FILE")]
    pub file_path: PathBuf,

    /// Database connection URL (overrides DATABASE_URL env var)
    #[arg(short = 'd', long, value_name = "URL")]
    pub database_url: Option<String>,

    /// Log every SQL statement
    #[arg(long)]
    pub sql_echo: bool,
}
