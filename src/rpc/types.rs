/// RPC Wire Types
///
/// Response shapes of the Nano node's `ledger`, `account_history` and `version` actions.
/// The node encodes most numbers as strings, booleans as `"true"`/`"false"`, and
/// empty maps or lists as an empty string; the helpers here accept every form.
use serde::{de::DeserializeOwned, Deserialize, Deserializer};
use std::collections::BTreeMap;

/// Summary info the `ledger` action reports per account
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AccountSummary {
    #[serde(deserialize_with = "u64_from_str_or_num")]
    pub block_count: u64,
}

/// One page of the global account listing, ordered by account identifier
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct LedgerPage {
    #[serde(default, deserialize_with = "empty_string_as_default")]
    pub accounts: BTreeMap<String, AccountSummary>,
}

/// A raw entry of an account history as returned by the node
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RawHistoryEntry {
    pub hash: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Counterparty account
    #[serde(default)]
    pub account: String,
    /// Amount in raw units
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(deserialize_with = "i64_from_str_or_num")]
    pub local_timestamp: i64,
    #[serde(default, deserialize_with = "bool_from_str_or_bool")]
    pub confirmed: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct HistoryResponse {
    #[serde(default, deserialize_with = "empty_string_as_default")]
    pub history: Vec<RawHistoryEntry>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default)]
    pub next: Option<String>,
}

/// One page of an account history plus the cursor of the page after it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryPage {
    pub entries: Vec<RawHistoryEntry>,
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeVersion {
    pub node_vendor: String,
    #[serde(default)]
    pub network: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OrEmptyString<T> {
    Value(T),
    Empty(String),
}

fn empty_string_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    match OrEmptyString::<T>::deserialize(deserializer)? {
        OrEmptyString::Value(value) => Ok(value),
        OrEmptyString::Empty(s) if s.is_empty() => Ok(T::default()),
        OrEmptyString::Empty(s) => Err(serde::de::Error::custom(format!("unexpected string {s:?}"))),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum<N> {
    Native(N),
    Str(String),
}

fn u64_from_str_or_num<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match StrOrNum::<u64>::deserialize(deserializer)? {
        StrOrNum::Native(n) => Ok(n),
        StrOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn i64_from_str_or_num<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    match StrOrNum::<i64>::deserialize(deserializer)? {
        StrOrNum::Native(n) => Ok(n),
        StrOrNum::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

fn bool_from_str_or_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match StrOrNum::<bool>::deserialize(deserializer)? {
        StrOrNum::Native(b) => Ok(b),
        StrOrNum::Str(s) => match s.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(serde::de::Error::custom(format!("invalid boolean {other:?}"))),
        },
    }
}
