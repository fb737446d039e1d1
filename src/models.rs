/// Data Models Module
///
/// This module defines the core data structures used throughout the crawler.
/// These models represent Nano ledger data (accounts, transaction records)
/// and their database representations.
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The account whose public key is all zeroes; it sorts before every other account.
pub const ZERO_ACCOUNT: &str = "nano_1111111111111111111111111111111111111111111111111111hifc8npp";

const ACCOUNT_ALPHABET: &str = "13456789abcdefghijkmnopqrstuwxyz";
const ACCOUNT_BODY_LEN: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccountError {
    #[error("account {0:?} has no nano_ or xrb_ prefix")]
    Prefix(String),
    #[error("account {0:?} must have {ACCOUNT_BODY_LEN} characters after the prefix")]
    Length(String),
    #[error("account {0:?} contains characters outside the account alphabet")]
    Alphabet(String),
}

/// A ledger account identifier.
///
/// Accounts compare by exact string identity, so the ordering used by the
/// ledger walk is plain lexicographic order of the textual form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Account(String);

impl Account {
    pub fn parse(s: &str) -> Result<Self, AccountError> {
        let body = s
            .strip_prefix("nano_")
            .or_else(|| s.strip_prefix("xrb_"))
            .ok_or_else(|| AccountError::Prefix(s.to_string()))?;

        if body.len() != ACCOUNT_BODY_LEN {
            return Err(AccountError::Length(s.to_string()));
        }
        if !body.chars().all(|c| ACCOUNT_ALPHABET.contains(c)) {
            return Err(AccountError::Alphabet(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    pub fn zero() -> Self {
        Self(ZERO_ACCOUNT.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Account {
    type Err = AccountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Account {
    type Error = AccountError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Account> for String {
    fn from(account: Account) -> Self {
        account.0
    }
}

/// Types of transactions we store
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Funds leaving the source account
    Send,
    /// Funds arriving at the source account
    Receive,
    Other,
}

impl TransactionType {
    /// Map a raw history entry type onto the closed set of stored types.
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "send" => Self::Send,
            "receive" => Self::Receive,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Send => "send",
            Self::Receive => "receive",
            Self::Other => "other",
        }
    }
}

/// Order in which an account history is walked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    NewestFirst,
    OldestFirst,
}

impl Direction {
    pub fn is_reverse(&self) -> bool {
        matches!(self, Self::OldestFirst)
    }
}

/// A confirmed ledger transaction as persisted in the `transactions` table
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub hash: String,
    pub account: Account,
    pub tx_type: TransactionType,
    pub amount: BigDecimal,
    pub link: String,
    pub tstamp: DateTime<Utc>,
}

/// An (account, display name) pair loaded by the known-accounts importer
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct KnownAccountEntry {
    pub account: Option<String>,
    pub alias: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_account_is_valid_and_smallest() {
        let zero = Account::zero();
        assert_eq!(Account::parse(ZERO_ACCOUNT).unwrap(), zero);

        let other = Account::parse("nano_3t6k35gi95xu6tergt6p69ck76ogmitsa8mnijtpxm9fkcm736xtoncuohr3").unwrap();
        assert!(zero < other);
    }

    #[test]
    fn test_account_rejects_malformed() {
        assert!(matches!(Account::parse("ban_1111"), Err(AccountError::Prefix(_))));
        assert!(matches!(Account::parse("nano_1111"), Err(AccountError::Length(_))));

        let bad_char = format!("nano_{}", "0".repeat(ACCOUNT_BODY_LEN));
        assert!(matches!(Account::parse(&bad_char), Err(AccountError::Alphabet(_))));

        let legacy = format!("xrb_{}", "1".repeat(ACCOUNT_BODY_LEN));
        assert!(Account::parse(&legacy).is_ok());
    }

    #[test]
    fn test_transaction_type_mapping() {
        assert_eq!(TransactionType::from_raw("send"), TransactionType::Send);
        assert_eq!(TransactionType::from_raw("receive"), TransactionType::Receive);
        assert_eq!(TransactionType::from_raw("change"), TransactionType::Other);
        assert_eq!(TransactionType::from_raw("open"), TransactionType::Other);
        assert_eq!(TransactionType::from_raw(""), TransactionType::Other);
        assert_eq!(TransactionType::from_raw("Send"), TransactionType::Other);

        for tx_type in [TransactionType::Send, TransactionType::Receive, TransactionType::Other] {
            assert_eq!(TransactionType::from_raw(tx_type.as_str()), tx_type);
        }
    }

    #[test]
    fn test_account_serde_validates() {
        let parsed: Account = serde_json::from_str(&format!("\"{}\"", ZERO_ACCOUNT)).unwrap();
        assert_eq!(parsed, Account::zero());
        assert!(serde_json::from_str::<Account>("\"nope\"").is_err());
    }
}
