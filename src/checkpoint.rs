/// Checkpoint Module
///
/// Tracks the resume point of the ledger walk: the highest account such that it
/// and every account dispatched before it have finished crawling. Restarting the
/// walk from that account never skips unfinished work.
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::models::Account;

#[derive(Debug, Clone)]
pub struct CheckpointTracker {
    safe: Account,
    in_flight: BTreeSet<Account>,
    finished: BTreeSet<Account>,
}

impl CheckpointTracker {
    pub fn new(start: Account) -> Self {
        Self { safe: start, in_flight: BTreeSet::new(), finished: BTreeSet::new() }
    }

    /// The current resume point
    pub fn safe(&self) -> &Account {
        &self.safe
    }

    pub fn dispatched<'a>(&mut self, accounts: impl IntoIterator<Item = &'a Account>) {
        self.in_flight.extend(accounts.into_iter().cloned());
    }

    /// Record a finished crawl; returns the new resume point if it moved.
    pub fn finished(&mut self, account: &Account) -> Option<&Account> {
        if !self.in_flight.remove(account) {
            return None;
        }
        self.finished.insert(account.clone());

        let before = self.safe.clone();
        while let Some(lowest) = self.finished.first() {
            if self.in_flight.first().is_some_and(|pending| pending < lowest) {
                break;
            }
            if let Some(lowest) = self.finished.pop_first() {
                self.safe = lowest;
            }
        }

        (self.safe != before).then_some(&self.safe)
    }
}

/// A resume point persisted in a plain text file
#[derive(Debug, Clone)]
pub struct CheckpointFile {
    path: PathBuf,
}

impl CheckpointFile {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored resume point, if the file exists
    pub async fn load(&self) -> Result<Option<Account>> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e).context(format!("Failed to read checkpoint {}", self.path.display())),
        };

        let account = Account::parse(contents.trim())
            .with_context(|| format!("Checkpoint {} holds an invalid account", self.path.display()))?;
        Ok(Some(account))
    }

    /// Replace the stored resume point; the old one stays intact until the new one is complete.
    pub async fn store(&self, account: &Account) -> Result<()> {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, format!("{}\n", account))
            .await
            .with_context(|| format!("Failed to write checkpoint {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .with_context(|| format!("Failed to replace checkpoint {}", self.path.display()))?;

        tracing::debug!("Checkpoint advanced to {}", account);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_account;

    #[test]
    fn test_advances_only_over_contiguous_finished_accounts() {
        let (a, b, c, d) = (test_account('a'), test_account('b'), test_account('c'), test_account('d'));
        let mut tracker = CheckpointTracker::new(Account::zero());
        tracker.dispatched([&a, &b, &c]);

        // b finishes first; a is still pending so nothing moves
        assert_eq!(tracker.finished(&b), None);
        assert_eq!(tracker.safe(), &Account::zero());

        assert_eq!(tracker.finished(&a), Some(&b));

        tracker.dispatched([&d]);
        assert_eq!(tracker.finished(&d), None);
        assert_eq!(tracker.finished(&c), Some(&d));
        assert_eq!(tracker.safe(), &d);
    }

    #[test]
    fn test_unknown_account_is_ignored() {
        let mut tracker = CheckpointTracker::new(Account::zero());
        assert_eq!(tracker.finished(&test_account('a')), None);
        assert_eq!(tracker.safe(), &Account::zero());
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let dir = std::env::temp_dir().join(format!("nano-ledger-crawler-ckpt-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = CheckpointFile::new(dir.join("cursor"));

        assert_eq!(file.load().await.unwrap(), None);

        file.store(&test_account('a')).await.unwrap();
        file.store(&test_account('b')).await.unwrap();
        assert_eq!(file.load().await.unwrap(), Some(test_account('b')));

        tokio::fs::write(file.path(), "garbage").await.unwrap();
        assert!(file.load().await.is_err());

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
