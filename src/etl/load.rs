/// Load Module
///
/// The ingestion writer: stores confirmed history entries as transaction records,
/// exactly once per hash, one atomic batch per history page.
use std::future::Future;
use thiserror::Error;

use super::transform::{parse_entry, EntryError};
use crate::models::{Account, Direction, TransactionRecord};
use crate::rpc::types::RawHistoryEntry;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Storage for transaction records, keyed by hash
pub trait TransactionStore: Send + Sync + 'static {
    /// Insert `records` in one atomic unit of work, skipping hashes that are already stored.
    ///
    /// Returns one flag per record: `true` when the record was newly inserted.
    fn insert_new(&self, records: &[TransactionRecord]) -> impl Future<Output = Result<Vec<bool>, StoreError>> + Send;
}

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Entry(#[from] EntryError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of ingesting one history page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestOutcome {
    /// Records newly written by this batch
    pub added: usize,
    /// The oldest confirmed entry of the page was already stored before this batch
    pub reached_known_history: bool,
}

impl IngestOutcome {
    /// Whether the crawler may fetch another page after this one
    pub fn should_continue(&self, direction: Direction) -> bool {
        match direction {
            Direction::NewestFirst => !self.reached_known_history,
            // an old record being present says nothing about newer ones
            Direction::OldestFirst => true,
        }
    }
}

/// Ingest one page of `account`'s history.
///
/// Unconfirmed entries are dropped before anything else, so they neither get stored
/// nor act as the dedup boundary.
pub async fn ingest_page<S: TransactionStore>(
    store: &S,
    account: &Account,
    entries: &[RawHistoryEntry],
    direction: Direction,
) -> Result<IngestOutcome, IngestError> {
    let records = entries
        .iter()
        .filter(|entry| entry.confirmed)
        .map(|entry| parse_entry(account, entry))
        .collect::<Result<Vec<_>, _>>()?;

    if records.is_empty() {
        return Ok(IngestOutcome::default());
    }

    let inserted = store.insert_new(&records).await?;
    let added = inserted.iter().filter(|new| **new).count();

    let oldest_inserted = match direction {
        Direction::NewestFirst => inserted.last(),
        Direction::OldestFirst => inserted.first(),
    };
    let reached_known_history = oldest_inserted.is_some_and(|new| !new);

    tracing::debug!("{}: stored {} of {} confirmed entries", account, added, records.len());
    Ok(IngestOutcome { added, reached_known_history })
}
