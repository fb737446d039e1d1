/// Crawl Session Context
///
/// Everything one crawl session shares between the driver and its workers:
/// the node client, the transaction store, the tuning knobs and the shutdown flag.
use std::time::Duration;
use tokio::sync::watch;

use crate::models::Direction;
use crate::retry::RetryPolicy;

/// Tuning for one crawl session
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub ledger_page_size: usize,
    pub history_page_size: usize,
    pub direction: Direction,
    pub workers: usize,
    pub max_outstanding: usize,
    pub retry: RetryPolicy,
    pub progress_interval: Duration,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            ledger_page_size: 4096,
            history_page_size: 4096,
            direction: Direction::NewestFirst,
            workers: 64,
            max_outstanding: 4096,
            retry: RetryPolicy::default(),
            progress_interval: Duration::from_secs(1),
        }
    }
}

pub struct CrawlContext<R, S> {
    pub rpc: R,
    pub store: S,
    pub settings: CrawlSettings,
    shutdown: watch::Receiver<bool>,
}

impl<R, S> CrawlContext<R, S> {
    pub fn new(rpc: R, store: S, settings: CrawlSettings, shutdown: watch::Receiver<bool>) -> Self {
        Self { rpc, store, settings, shutdown }
    }

    /// Whether a graceful shutdown has been requested
    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }
}
