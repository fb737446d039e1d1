/// Account Crawler Module
///
/// Walks every page of a single account's history, ingesting confirmed entries
/// until the history runs out or (newest-first only) already-stored history is reached.
use thiserror::Error;

use crate::context::CrawlContext;
use crate::etl::extract::fetch_history_page;
use crate::etl::load::{ingest_page, IngestError, TransactionStore};
use crate::models::Account;
use crate::retry::FetchError;
use crate::rpc::LedgerRpc;

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("fetching history failed after {ingested} new records: {source}")]
    Fetch {
        ingested: u64,
        #[source]
        source: FetchError,
    },
    #[error("ingesting history failed after {ingested} new records: {source}")]
    Ingest {
        ingested: u64,
        #[source]
        source: IngestError,
    },
    #[error("stopped for shutdown after {ingested} new records")]
    Interrupted { ingested: u64 },
}

impl CrawlError {
    /// Records committed before the failure; they stay stored
    pub fn ingested(&self) -> u64 {
        match self {
            Self::Fetch { ingested, .. } | Self::Ingest { ingested, .. } | Self::Interrupted { ingested } => *ingested,
        }
    }

    /// The crawl was cut short by shutdown; older history may still be missing
    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

/// Crawl one account's history, returning the number of newly stored records.
///
/// Pages are fetched strictly in sequence. A shutdown request is honoured between
/// pages, so the page in flight is always committed first; a crawl that stops with
/// history left unfetched reports `CrawlError::Interrupted`.
pub async fn crawl_account<R, S>(ctx: &CrawlContext<R, S>, account: &Account) -> Result<u64, CrawlError>
where
    R: LedgerRpc,
    S: TransactionStore,
{
    let settings = &ctx.settings;
    let mut ingested = 0u64;
    let mut head: Option<String> = None;

    loop {
        let page = fetch_history_page(
            &ctx.rpc,
            &settings.retry,
            account,
            settings.history_page_size,
            head.as_deref(),
            settings.direction,
        )
        .await
        .map_err(|source| CrawlError::Fetch { ingested, source })?;

        if page.entries.is_empty() {
            break;
        }

        let outcome = ingest_page(&ctx.store, account, &page.entries, settings.direction)
            .await
            .map_err(|source| CrawlError::Ingest { ingested, source })?;
        ingested += outcome.added as u64;

        if !outcome.should_continue(settings.direction) {
            tracing::debug!("{}: reached already stored history", account);
            break;
        }

        match page.cursor {
            Some(cursor) if !ctx.is_shutting_down() => head = Some(cursor),
            Some(_) => {
                tracing::info!("{}: stopping early for shutdown", account);
                return Err(CrawlError::Interrupted { ingested });
            }
            None => break,
        }
    }

    Ok(ingested)
}
