/// Scheduler Module
///
/// Runs account crawls concurrently. Every dispatched account becomes a task in a
/// `JoinSet`; a semaphore caps how many of them talk to the node at once, and the
/// set's length is the outstanding-work count the driver applies backpressure on.
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{Id, JoinError, JoinSet};

use crate::context::CrawlContext;
use crate::crawler::{crawl_account, CrawlError};
use crate::etl::load::TransactionStore;
use crate::models::Account;
use crate::rpc::LedgerRpc;

/// A finished account crawl
#[derive(Debug)]
pub struct AccountOutcome {
    pub account: Account,
    pub result: Result<u64, AccountFailure>,
}

#[derive(Debug, thiserror::Error)]
pub enum AccountFailure {
    #[error(transparent)]
    Crawl(#[from] CrawlError),
    #[error("crawl task aborted: {0}")]
    Task(#[from] JoinError),
}

impl AccountOutcome {
    /// Stopped by shutdown before the account's history was exhausted
    pub fn is_interrupted(&self) -> bool {
        matches!(&self.result, Err(AccountFailure::Crawl(e)) if e.is_interrupted())
    }

    /// Records this crawl added to storage, including those committed before a failure
    pub fn ingested(&self) -> u64 {
        match &self.result {
            Ok(count) => *count,
            Err(AccountFailure::Crawl(e)) => e.ingested(),
            Err(AccountFailure::Task(_)) => 0,
        }
    }
}

pub struct Scheduler<R, S> {
    ctx: Arc<CrawlContext<R, S>>,
    permits: Arc<Semaphore>,
    tasks: JoinSet<Result<u64, CrawlError>>,
    accounts: HashMap<Id, Account>,
}

impl<R, S> Scheduler<R, S>
where
    R: LedgerRpc,
    S: TransactionStore,
{
    pub fn new(ctx: Arc<CrawlContext<R, S>>) -> Self {
        let permits = Arc::new(Semaphore::new(ctx.settings.workers.max(1)));
        Self { ctx, permits, tasks: JoinSet::new(), accounts: HashMap::new() }
    }

    /// Crawls dispatched but not yet reaped
    pub fn outstanding(&self) -> usize {
        self.tasks.len()
    }

    /// Queue a crawl for each account; at most `workers` of them run at a time.
    /// Crawls still queued when shutdown is requested never start.
    pub fn dispatch(&mut self, accounts: Vec<Account>) {
        for account in accounts {
            let ctx = Arc::clone(&self.ctx);
            let permits = Arc::clone(&self.permits);
            let task_account = account.clone();

            let handle = self.tasks.spawn(async move {
                // the semaphore is never closed
                let _permit = permits.acquire_owned().await.ok();
                if ctx.is_shutting_down() {
                    return Err(CrawlError::Interrupted { ingested: 0 });
                }
                crawl_account(&ctx, &task_account).await
            });
            self.accounts.insert(handle.id(), account);
        }
    }

    /// Collect every crawl that has already finished, without waiting.
    pub fn reap(&mut self) -> Vec<AccountOutcome> {
        let mut finished = Vec::new();
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            finished.push(self.outcome(joined));
        }
        finished
    }

    /// Wait up to `timeout` for the next crawl to finish.
    pub async fn next_completion(&mut self, timeout: Duration) -> Option<AccountOutcome> {
        match tokio::time::timeout(timeout, self.tasks.join_next_with_id()).await {
            Ok(Some(joined)) => Some(self.outcome(joined)),
            Ok(None) | Err(_) => None,
        }
    }

    fn outcome(&mut self, joined: Result<(Id, Result<u64, CrawlError>), JoinError>) -> AccountOutcome {
        let (id, result) = match joined {
            Ok((id, result)) => (id, result.map_err(AccountFailure::from)),
            Err(e) => (e.id(), Err(AccountFailure::Task(e))),
        };

        let account = self.accounts.remove(&id).unwrap_or_else(|| {
            tracing::error!("Finished crawl task {} has no recorded account", id);
            Account::zero()
        });

        AccountOutcome { account, result }
    }
}
