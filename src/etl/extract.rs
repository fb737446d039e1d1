/// Extract Module
///
/// Pulls data out of the node: single history pages for one account, and
/// successive pages of the global account listing (the ledger frontier).
use std::collections::BTreeMap;

use crate::models::{Account, Direction};
use crate::retry::{FetchError, RetryPolicy};
use crate::rpc::types::{AccountSummary, HistoryPage};
use crate::rpc::LedgerRpc;

/// Fetch one page of `account`'s history, retrying transient failures.
///
/// An empty page with no cursor means the history is exhausted.
pub async fn fetch_history_page<R: LedgerRpc>(
    rpc: &R,
    retry: &RetryPolicy,
    account: &Account,
    page_size: usize,
    head: Option<&str>,
    direction: Direction,
) -> Result<HistoryPage, FetchError> {
    let what = format!("account_history for {}", account);
    retry.run(&what, || rpc.account_history(account, page_size, head, direction)).await
}

/// Walks the global account listing in ascending account order.
#[derive(Debug, Clone)]
pub struct LedgerWalker {
    cursor: Account,
    page_size: usize,
    history_page_size: usize,
}

impl LedgerWalker {
    pub fn new(start: Account, page_size: usize, history_page_size: usize) -> Self {
        Self { cursor: start, page_size, history_page_size }
    }

    /// The last account handed out (or the starting account)
    pub fn cursor(&self) -> &Account {
        &self.cursor
    }

    /// Fetch the next ledger page and return the accounts strictly after the cursor.
    ///
    /// An empty result means the node has no further accounts. A full page that
    /// yields nothing usable (only the cursor and malformed identifiers) is
    /// requested again with a larger count until a usable account or the end
    /// of the ledger shows up.
    pub async fn next_batch<R: LedgerRpc>(&mut self, rpc: &R, retry: &RetryPolicy) -> Result<Vec<Account>, FetchError> {
        let mut count = self.page_size;
        let mut previous_len = 0;

        loop {
            let what = format!("ledger from {}", self.cursor);
            let page = retry.run(&what, || rpc.ledger(&self.cursor, count)).await?;

            let batch = self.accept(&page.accounts);
            if let Some(last) = batch.last() {
                self.cursor = last.clone();
                return Ok(batch);
            }

            let len = page.accounts.len();
            if len < count {
                return Ok(batch);
            }
            if len <= previous_len {
                tracing::error!("Ledger after {} holds {} unusable entries and no more are returned", self.cursor, len);
                return Ok(batch);
            }

            previous_len = len;
            count = count.saturating_mul(2);
            tracing::warn!("Ledger page after {} holds no usable account, widening to {}", self.cursor, count);
        }
    }

    fn accept(&self, accounts: &BTreeMap<String, AccountSummary>) -> Vec<Account> {
        let mut batch = Vec::with_capacity(accounts.len());

        // BTreeMap iteration is already sorted by account identifier
        for (raw, summary) in accounts {
            let account = match Account::parse(raw) {
                Ok(account) => account,
                Err(e) => {
                    tracing::warn!("Skipping ledger entry: {}", e);
                    continue;
                }
            };

            if account <= self.cursor {
                continue;
            }

            if summary.block_count > self.history_page_size as u64 {
                tracing::warn!(
                    "Account {} has more than {} blocks: {}",
                    account,
                    self.history_page_size,
                    summary.block_count
                );
            }

            batch.push(account);
        }

        batch
    }
}
