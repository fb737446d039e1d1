//! Nano Ledger Crawler
//!
//! Discovers every account on a Nano node, walks each account's history and stores
//! newly seen confirmed transactions in PostgreSQL exactly once.

pub mod checkpoint;
pub mod cli;
pub mod context;
pub mod crawler;
pub mod db;
pub mod etl;
pub mod known_accounts;
pub mod models;
pub mod pipeline;
pub mod retry;
pub mod rpc;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod testing;

/// Log filter for the binaries, honouring `RUST_LOG`; `sql_echo` surfaces every executed statement.
pub fn log_filter(sql_echo: bool) -> tracing_subscriber::EnvFilter {
    let base = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let sqlx_level = if sql_echo { "sqlx::query=debug" } else { "sqlx::query=warn" };

    tracing_subscriber::EnvFilter::new(format!("{},{}", base, sqlx_level))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_sql_echo() {
        assert!(log_filter(true).to_string().to_lowercase().contains("sqlx::query=debug"));
        assert!(log_filter(false).to_string().to_lowercase().contains("sqlx::query=warn"));
    }
}
