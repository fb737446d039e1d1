/// Pipeline Module
///
/// The crawl driver: walks the ledger frontier, feeds discovered accounts to the
/// scheduler, holds off discovery while too much work is outstanding, and reports
/// progress until the node runs out of accounts.
use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::checkpoint::{CheckpointFile, CheckpointTracker};
use crate::context::CrawlContext;
use crate::etl::extract::LedgerWalker;
use crate::etl::load::TransactionStore;
use crate::models::Account;
use crate::rpc::LedgerRpc;
use crate::scheduler::{AccountOutcome, Scheduler};

/// Crawl execution statistics
#[derive(Debug, Clone, Default)]
pub struct CrawlStats {
    pub accounts_processed: u64,
    pub accounts_failed: u64,
    pub accounts_interrupted: u64,
    pub transactions_ingested: u64,
    pub peak_outstanding: usize,
    pub elapsed_time: Duration,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accounts_per_second(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.accounts_processed as f64 / secs
        }
    }

    pub fn transactions_per_second(&self) -> f64 {
        let secs = self.elapsed_time.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.transactions_ingested as f64 / secs
        }
    }

    fn record(&mut self, outcome: &AccountOutcome) {
        self.transactions_ingested += outcome.ingested();

        if outcome.is_interrupted() {
            self.accounts_interrupted += 1;
            tracing::info!("Crawl of account {} interrupted by shutdown", outcome.account);
            return;
        }

        self.accounts_processed += 1;
        if let Err(e) = &outcome.result {
            self.accounts_failed += 1;
            tracing::error!("Crawl of account {} failed: {}", outcome.account, e);
        }
    }
}

/// Where the driver is in its cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlState {
    Discovering,
    Dispatching(Vec<Account>),
    Draining,
    Terminated,
}

/// Top-level crawl driver
pub struct Pipeline<R, S> {
    ctx: Arc<CrawlContext<R, S>>,
    walker: LedgerWalker,
    scheduler: Scheduler<R, S>,
    tracker: CheckpointTracker,
    checkpoint: Option<CheckpointFile>,
    stats: CrawlStats,
}

impl<R, S> Pipeline<R, S>
where
    R: LedgerRpc,
    S: TransactionStore,
{
    /// Create a driver that starts walking the ledger after `start`
    pub fn new(ctx: Arc<CrawlContext<R, S>>, start: Account) -> Self {
        let settings = &ctx.settings;
        let walker = LedgerWalker::new(start.clone(), settings.ledger_page_size, settings.history_page_size);
        let scheduler = Scheduler::new(Arc::clone(&ctx));

        let tracker = CheckpointTracker::new(start);

        Self { ctx, walker, scheduler, tracker, checkpoint: None, stats: CrawlStats::new() }
    }

    /// Persist the resume point to `checkpoint` as the crawl advances
    pub fn with_checkpoint(mut self, checkpoint: CheckpointFile) -> Self {
        self.checkpoint = Some(checkpoint);
        self
    }

    /// Run until the ledger is exhausted or shutdown is requested, then wait for in-flight crawls.
    pub async fn run(mut self) -> Result<CrawlStats> {
        let start_time = Instant::now();
        let settings = self.ctx.settings.clone();

        tracing::info!("Starting crawl after account {}", self.walker.cursor());

        println!("\n🚀 Starting ledger crawl...");
        println!("   📍 Start account: {}", self.walker.cursor());
        println!("   👷 Workers: {}", settings.workers);
        println!("   📦 Ledger batch: {} | History batch: {}", settings.ledger_page_size, settings.history_page_size);
        println!("   ⏳ Max awaiting: {}", settings.max_outstanding);

        let mut state = CrawlState::Discovering;

        loop {
            state = match state {
                CrawlState::Discovering => {
                    if self.ctx.is_shutting_down() {
                        tracing::info!("Shutdown requested, no further accounts will be dispatched");
                        CrawlState::Terminated
                    } else {
                        let batch = self
                            .walker
                            .next_batch(&self.ctx.rpc, &settings.retry)
                            .await
                            .with_context(|| format!("Failed to fetch ledger after {}", self.walker.cursor()))?;

                        if batch.is_empty() {
                            tracing::warn!("No more accounts found");
                            CrawlState::Terminated
                        } else {
                            CrawlState::Dispatching(batch)
                        }
                    }
                }
                CrawlState::Dispatching(batch) => {
                    self.tracker.dispatched(&batch);
                    self.scheduler.dispatch(batch);
                    self.stats.peak_outstanding = self.stats.peak_outstanding.max(self.scheduler.outstanding());
                    CrawlState::Draining
                }
                CrawlState::Draining => {
                    let engaged =
                        self.scheduler.outstanding() > settings.max_outstanding && !self.ctx.is_shutting_down();
                    self.drain_step(engaged).await?;

                    if self.scheduler.outstanding() > settings.max_outstanding && !self.ctx.is_shutting_down() {
                        CrawlState::Draining
                    } else {
                        CrawlState::Discovering
                    }
                }
                CrawlState::Terminated => break,
            };
        }

        while self.scheduler.outstanding() > 0 {
            self.drain_step(true).await?;
        }

        self.stats.elapsed_time = start_time.elapsed();

        println!("\n✅ Crawl complete!");
        self.print_final_stats();

        Ok(self.stats)
    }

    /// Reap finished crawls and report progress. With `block` set and nothing finished
    /// yet, wait for the next completion, but no longer than the progress interval.
    async fn drain_step(&mut self, block: bool) -> Result<()> {
        let mut finished = self.scheduler.reap();

        if finished.is_empty() && block && self.scheduler.outstanding() > 0 {
            if let Some(outcome) = self.scheduler.next_completion(self.ctx.settings.progress_interval).await {
                finished.push(outcome);
                finished.extend(self.scheduler.reap());
            }
        }

        let mut advanced = None;
        for outcome in &finished {
            self.stats.record(outcome);
            // an interrupted account stays pending, holding the resume point below it
            if outcome.is_interrupted() {
                continue;
            }
            if let Some(safe) = self.tracker.finished(&outcome.account) {
                advanced = Some(safe.clone());
            }
        }

        if let (Some(safe), Some(checkpoint)) = (advanced, &self.checkpoint) {
            checkpoint.store(&safe).await?;
        }

        self.print_progress();
        Ok(())
    }

    fn print_progress(&self) {
        println!(
            "   📊 Processed: {} accounts, {} blocks, last account: {} (awaiting results: {})",
            self.stats.accounts_processed,
            self.stats.transactions_ingested,
            self.walker.cursor(),
            self.scheduler.outstanding()
        );
    }

    fn print_final_stats(&self) {
        let stats = &self.stats;
        println!("\n📊 Crawl Statistics:");
        println!("   ⏱️  Total time: {:.2}s", stats.elapsed_time.as_secs_f64());
        println!(
            "   👤 Accounts: {} processed, {} failed, {} interrupted",
            stats.accounts_processed, stats.accounts_failed, stats.accounts_interrupted
        );
        println!("   💾 Transactions ingested: {}", stats.transactions_ingested);
        println!("   ⏳ Peak awaiting results: {}", stats.peak_outstanding);
        println!("   ⚡ Speed: {:.2} accounts/sec", stats.accounts_per_second());
        println!("   ⚡ Throughput: {:.0} txs/sec", stats.transactions_per_second());
        println!("   📍 Resume point: {}", self.tracker.safe());
    }
}
