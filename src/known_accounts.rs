/// Known Accounts Module
///
/// Loads (account, alias) pairs from a JSON export and prepares them for the
/// `known_accounts` table.
use anyhow::{Context, Result};
use std::path::Path;

use crate::models::KnownAccountEntry;

/// Read a JSON array of `{"account": ..., "alias": ...}` objects
pub async fn load_entries(path: &Path) -> Result<Vec<KnownAccountEntry>> {
    let contents =
        tokio::fs::read_to_string(path).await.with_context(|| format!("Failed to read {}", path.display()))?;

    serde_json::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Keep entries that have both a non-empty account and a non-empty alias
pub fn usable_entries(entries: Vec<KnownAccountEntry>) -> Vec<(String, String)> {
    entries
        .into_iter()
        .filter_map(|entry| match (entry.account, entry.alias) {
            (Some(account), Some(alias)) if !account.is_empty() && !alias.is_empty() => Some((account, alias)),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_entries_skip_incomplete() {
        let entries: Vec<KnownAccountEntry> = serde_json::from_value(serde_json::json!([
            { "account": "nano_1abc", "alias": "Exchange" },
            { "account": null, "alias": "Nobody" },
            { "account": "", "alias": "Empty" },
            { "account": "nano_1def", "alias": "" },
            { "account": "nano_1ghi" },
            { "account": "nano_1jkl", "alias": "Faucet", "extra": true }
        ]))
        .unwrap();

        assert_eq!(
            usable_entries(entries),
            vec![
                ("nano_1abc".to_string(), "Exchange".to_string()),
                ("nano_1jkl".to_string(), "Faucet".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_load_entries_from_file() {
        let path = std::env::temp_dir().join(format!("known-accounts-{}.json", std::process::id()));
        tokio::fs::write(&path, r#"[{"account": "nano_1abc", "alias": "Exchange"}]"#).await.unwrap();

        let entries = load_entries(&path).await.unwrap();
        assert_eq!(
            entries,
            vec![KnownAccountEntry { account: Some("nano_1abc".to_string()), alias: Some("Exchange".to_string()) }]
        );

        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(load_entries(&path).await.is_err());

        tokio::fs::remove_file(&path).await.unwrap();
    }
}
