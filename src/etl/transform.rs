/// Transform Module
///
/// Turns raw history entries into transaction records: type mapping,
/// raw-to-nano amount scaling and timestamp conversion.
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::str::FromStr;
use thiserror::Error;

use crate::models::{Account, TransactionRecord, TransactionType};
use crate::rpc::types::RawHistoryEntry;

/// Number of decimal places between raw units and nano (1 nano = 10^30 raw)
pub const RAW_SCALE_DIGITS: i64 = 30;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry {hash} has invalid amount {amount:?}")]
    Amount { hash: String, amount: String },
    #[error("entry {hash} has out of range timestamp {timestamp}")]
    Timestamp { hash: String, timestamp: i64 },
    #[error("entry has an empty hash")]
    MissingHash,
}

/// Convert an amount in raw units into nano.
///
/// The shift is applied to the decimal exponent, so no digits are lost.
pub fn raw_to_nano(raw: &str) -> Option<BigDecimal> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let (digits, scale) = BigDecimal::from_str(raw).ok()?.into_bigint_and_exponent();
    Some(BigDecimal::new(digits, scale + RAW_SCALE_DIGITS))
}

/// Parse a confirmed raw entry from `account`'s history into a transaction record
pub fn parse_entry(account: &Account, entry: &RawHistoryEntry) -> Result<TransactionRecord, EntryError> {
    if entry.hash.is_empty() {
        return Err(EntryError::MissingHash);
    }

    let raw_amount = entry.amount.as_deref().unwrap_or("0");
    let amount = raw_to_nano(raw_amount)
        .ok_or_else(|| EntryError::Amount { hash: entry.hash.clone(), amount: raw_amount.to_string() })?;

    let tstamp: DateTime<Utc> = DateTime::from_timestamp(entry.local_timestamp, 0)
        .ok_or_else(|| EntryError::Timestamp { hash: entry.hash.clone(), timestamp: entry.local_timestamp })?;

    Ok(TransactionRecord {
        hash: entry.hash.clone(),
        account: account.clone(),
        tx_type: TransactionType::from_raw(&entry.kind),
        amount,
        link: entry.account.clone(),
        tstamp,
    })
}
