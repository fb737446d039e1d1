/// Test Doubles
///
/// A scripted in-process node and an in-memory transaction store, shared by the
/// unit tests of every component.
use bigdecimal::BigDecimal;
use chrono::DateTime;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::watch;

use crate::context::{CrawlContext, CrawlSettings};
use crate::etl::load::{StoreError, TransactionStore};
use crate::models::{Account, Direction, TransactionRecord, TransactionType};
use crate::rpc::types::{AccountSummary, HistoryPage, LedgerPage, NodeVersion, RawHistoryEntry};
use crate::rpc::{LedgerRpc, RpcError};

/// A syntactically valid account made of one repeated character
pub fn test_account(c: char) -> Account {
    Account::parse(&format!("nano_1{}", c.to_string().repeat(59))).unwrap()
}

/// A confirmed entry moving `nano` whole nano
pub fn confirmed(hash: &str, kind: &str, nano: u64) -> RawHistoryEntry {
    RawHistoryEntry {
        hash: hash.to_string(),
        kind: kind.to_string(),
        account: "nano_counterparty".to_string(),
        amount: Some(format!("{}{}", nano, "0".repeat(30))),
        local_timestamp: 1_600_000_000,
        confirmed: true,
    }
}

pub fn unconfirmed(hash: &str) -> RawHistoryEntry {
    RawHistoryEntry { confirmed: false, ..confirmed(hash, "send", 1) }
}

pub fn test_context<R, S>(
    rpc: R,
    store: S,
    settings: CrawlSettings,
) -> (CrawlContext<R, S>, watch::Sender<bool>) {
    let (tx, rx) = watch::channel(false);
    (CrawlContext::new(rpc, store, settings, rx), tx)
}

#[derive(Default)]
struct MockState {
    ledger: BTreeMap<String, AccountSummary>,
    ledger_failures: usize,
    ledger_calls: usize,
    /// (account, head) -> page
    history: HashMap<(Account, Option<String>), HistoryPage>,
    history_failures: HashMap<Account, usize>,
    failing_heads: HashMap<Account, String>,
    history_heads: HashMap<Account, Vec<Option<String>>>,
    history_delay: Duration,
}

/// A node that serves a scripted ledger and scripted history pages
#[derive(Default)]
pub struct MockRpc {
    state: Mutex<MockState>,
    concurrent: AtomicUsize,
    peak_concurrent: AtomicUsize,
}

impl MockRpc {
    pub fn add_account(&self, account: &Account, block_count: u64) {
        self.add_raw_account(account.as_str(), block_count);
    }

    pub fn add_raw_account(&self, account: &str, block_count: u64) {
        self.state.lock().unwrap().ledger.insert(account.to_string(), AccountSummary { block_count });
    }

    pub fn add_history_page(
        &self,
        account: &Account,
        head: Option<&str>,
        entries: Vec<RawHistoryEntry>,
        cursor: Option<&str>,
    ) {
        let page = HistoryPage { entries, cursor: cursor.map(str::to_string) };
        self.state.lock().unwrap().history.insert((account.clone(), head.map(str::to_string)), page);
    }

    pub fn fail_ledger_times(&self, times: usize) {
        self.state.lock().unwrap().ledger_failures = times;
    }

    pub fn fail_history_times(&self, account: &Account, times: usize) {
        self.state.lock().unwrap().history_failures.insert(account.clone(), times);
    }

    /// Every request for `account` resuming at `head` times out
    pub fn fail_history_at(&self, account: &Account, head: &str) {
        self.state.lock().unwrap().failing_heads.insert(account.clone(), head.to_string());
    }

    pub fn set_history_delay(&self, delay: Duration) {
        self.state.lock().unwrap().history_delay = delay;
    }

    /// Heads of the successful history requests for `account`, in order
    pub fn history_heads(&self, account: &Account) -> Vec<Option<String>> {
        self.state.lock().unwrap().history_heads.get(account).cloned().unwrap_or_default()
    }

    pub fn ledger_calls(&self) -> usize {
        self.state.lock().unwrap().ledger_calls
    }

    pub fn peak_concurrent_history(&self) -> usize {
        self.peak_concurrent.load(Ordering::SeqCst)
    }

    fn history_response(&self, account: &Account, head: Option<&str>) -> Result<HistoryPage, RpcError> {
        let mut state = self.state.lock().unwrap();

        if let Some(remaining) = state.history_failures.get_mut(account) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(RpcError::Timeout { action: "account_history" });
            }
        }
        if head.is_some() && state.failing_heads.get(account).map(String::as_str) == head {
            return Err(RpcError::Timeout { action: "account_history" });
        }

        state.history_heads.entry(account.clone()).or_default().push(head.map(str::to_string));
        let key = (account.clone(), head.map(str::to_string));
        Ok(state.history.get(&key).cloned().unwrap_or_default())
    }
}

impl LedgerRpc for MockRpc {
    async fn version(&self) -> Result<NodeVersion, RpcError> {
        Ok(NodeVersion { node_vendor: "Mock Node".to_string(), network: Some("test".to_string()) })
    }

    async fn ledger(&self, start: &Account, count: usize) -> Result<LedgerPage, RpcError> {
        let mut state = self.state.lock().unwrap();
        state.ledger_calls += 1;

        if state.ledger_failures > 0 {
            state.ledger_failures -= 1;
            return Err(RpcError::Malformed { action: "ledger", message: "truncated body".to_string() });
        }

        // like the node, the start account itself is included
        let accounts = state
            .ledger
            .range(start.as_str().to_string()..)
            .take(count)
            .map(|(account, summary)| (account.clone(), summary.clone()))
            .collect();
        Ok(LedgerPage { accounts })
    }

    async fn account_history(
        &self,
        account: &Account,
        _count: usize,
        head: Option<&str>,
        _direction: Direction,
    ) -> Result<HistoryPage, RpcError> {
        let delay = self.state.lock().unwrap().history_delay;

        let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_concurrent.fetch_max(now, Ordering::SeqCst);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let response = self.history_response(account, head);
        self.concurrent.fetch_sub(1, Ordering::SeqCst);

        response
    }
}

/// Transaction storage in a map, with switchable write failures
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<BTreeMap<String, TransactionRecord>>,
    failing: AtomicBool,
}

impl MemoryStore {
    /// Pretend a record with `hash` was stored by an earlier run
    pub fn seed(&self, hash: &str) {
        let record = TransactionRecord {
            hash: hash.to_string(),
            account: Account::zero(),
            tx_type: TransactionType::Other,
            amount: BigDecimal::from(0),
            link: String::new(),
            tstamp: DateTime::from_timestamp(0, 0).unwrap(),
        };
        self.records.lock().unwrap().insert(hash.to_string(), record);
    }

    pub fn fail_writes(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.records.lock().unwrap().contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored records ordered by hash
    pub fn records(&self) -> Vec<TransactionRecord> {
        self.records.lock().unwrap().values().cloned().collect()
    }
}

impl TransactionStore for MemoryStore {
    async fn insert_new(&self, records: &[TransactionRecord]) -> Result<Vec<bool>, StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }

        let mut stored = self.records.lock().unwrap();
        let inserted = records
            .iter()
            .map(|record| {
                if stored.contains_key(&record.hash) {
                    false
                } else {
                    stored.insert(record.hash.clone(), record.clone());
                    true
                }
            })
            .collect();
        Ok(inserted)
    }
}
