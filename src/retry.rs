/// Retry Module
///
/// An explicit retry policy for remote calls: how many attempts, how long to wait
/// between them, and which kinds of failure are worth another attempt.
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

use crate::rpc::{ErrorKind, RpcError};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {last}")]
    Exhausted {
        attempts: usize,
        #[source]
        last: RpcError,
    },
    #[error("non-retryable failure: {0}")]
    Fatal(#[source] RpcError),
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
    pub retryable: Vec<ErrorKind>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            delay: Duration::from_secs(1),
            retryable: vec![ErrorKind::Timeout, ErrorKind::Connection, ErrorKind::Malformed],
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self { max_attempts, delay, ..Self::default() }
    }

    pub fn is_retryable(&self, err: &RpcError) -> bool {
        self.retryable.contains(&err.kind())
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the attempt ceiling is hit.
    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, FetchError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcError>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if !self.is_retryable(&e) => return Err(FetchError::Fatal(e)),
                Err(e) if attempt >= max_attempts => return Err(FetchError::Exhausted { attempts: attempt, last: e }),
                Err(e) => {
                    tracing::warn!("{} failed, retrying ({}/{}): {}", what, attempt, max_attempts, e);
                    tokio::time::sleep(self.delay).await;
                }
            }
        }
    }
}
