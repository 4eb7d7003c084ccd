//! Batch loader: fetches a range of ledger entities one by one, pacing
//! requests and retrying once when the endpoint rate-limits.
//!
//! A failed key is recorded as a miss; the batch itself never aborts.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use signalpool_rpc::ReadError;
use tracing::{debug, info, warn};

use crate::wait::Sleeper;

/// Errors that can tell a throttled request from a real failure.
pub trait RateLimitSignal {
    fn is_rate_limited(&self) -> bool;
}

impl RateLimitSignal for ReadError {
    fn is_rate_limited(&self) -> bool {
        ReadError::is_rate_limited(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Pause after each successful fetch.
    pub item_delay: Duration,
    /// Multiplier on `item_delay` before the single rate-limit retry.
    pub rate_limit_backoff_factor: u32,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            item_delay: Duration::from_millis(200),
            rate_limit_backoff_factor: 5,
        }
    }
}

impl BatchOptions {
    pub fn backoff(&self) -> Duration {
        self.item_delay * self.rate_limit_backoff_factor
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MissReason {
    /// Still rate-limited after the retry.
    RateLimited(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchEntry<T> {
    pub key: u64,
    pub outcome: Result<T, MissReason>,
    pub retries: u32,
}

/// Per-key results, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport<T> {
    pub entries: Vec<BatchEntry<T>>,
}

impl<T> BatchReport<T> {
    pub fn loaded(&self) -> Vec<&T> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().ok())
            .collect()
    }

    pub fn misses(&self) -> Vec<(u64, &MissReason)> {
        self.entries
            .iter()
            .filter_map(|e| e.outcome.as_ref().err().map(|r| (e.key, r)))
            .collect()
    }

    pub fn retries_for(&self, key: u64) -> u32 {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.retries)
            .unwrap_or(0)
    }

    pub fn into_loaded(self) -> Vec<T> {
        self.entries
            .into_iter()
            .filter_map(|e| e.outcome.ok())
            .collect()
    }
}

pub struct BatchLoader {
    options: BatchOptions,
    sleeper: Arc<dyn Sleeper>,
}

impl BatchLoader {
    pub fn new(options: BatchOptions, sleeper: Arc<dyn Sleeper>) -> Self {
        Self { options, sleeper }
    }

    /// Load keys `1..=count`.
    pub async fn load_range<T, E, F, Fut>(&self, count: u64, fetch_one: F) -> BatchReport<T>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        self.load(1..=count, count, fetch_one).await
    }

    /// Load `keys` in order.
    pub async fn load_keys<T, E, F, Fut>(&self, keys: &[u64], fetch_one: F) -> BatchReport<T>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        self.load(keys.iter().copied(), keys.len() as u64, fetch_one).await
    }

    /// `len` is the number of keys `keys` yields; no pause follows the last.
    async fn load<T, E, F, Fut>(
        &self,
        keys: impl IntoIterator<Item = u64>,
        len: u64,
        mut fetch_one: F,
    ) -> BatchReport<T>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: RateLimitSignal + Display,
    {
        let mut entries = Vec::new();

        for (index, key) in (1..).zip(keys) {
            let is_last = index == len;

            let entry = match fetch_one(key).await {
                Ok(value) => {
                    if !is_last {
                        self.sleeper.sleep(self.options.item_delay).await;
                    }
                    BatchEntry {
                        key,
                        outcome: Ok(value),
                        retries: 0,
                    }
                }
                Err(e) if e.is_rate_limited() => {
                    warn!(key, error = %e, "rate limited, backing off before retry");
                    self.sleeper.sleep(self.options.backoff()).await;
                    let outcome = match fetch_one(key).await {
                        Ok(value) => Ok(value),
                        Err(e) => {
                            warn!(key, error = %e, "retry failed");
                            Err(if e.is_rate_limited() {
                                MissReason::RateLimited(e.to_string())
                            } else {
                                MissReason::Failed(e.to_string())
                            })
                        }
                    };
                    BatchEntry {
                        key,
                        outcome,
                        retries: 1,
                    }
                }
                Err(e) => {
                    warn!(key, error = %e, "fetch failed");
                    BatchEntry {
                        key,
                        outcome: Err(MissReason::Failed(e.to_string())),
                        retries: 0,
                    }
                }
            };
            debug!(key, ok = entry.outcome.is_ok(), "batch item done");
            entries.push(entry);
        }

        let report = BatchReport { entries };
        info!(
            requested = len,
            loaded = report.loaded().len(),
            missed = report.misses().len(),
            "batch load finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wait::InstantSleeper;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct FakeError {
        limited: bool,
    }

    impl Display for FakeError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            if self.limited {
                f.write_str("HTTP 429")
            } else {
                f.write_str("boom")
            }
        }
    }

    impl RateLimitSignal for FakeError {
        fn is_rate_limited(&self) -> bool {
            self.limited
        }
    }

    fn loader(sleeper: &Arc<InstantSleeper>) -> BatchLoader {
        BatchLoader::new(BatchOptions::default(), sleeper.clone())
    }

    #[tokio::test]
    async fn test_all_succeed_with_pacing() {
        let sleeper = Arc::new(InstantSleeper::new());
        let report = loader(&sleeper)
            .load_range(3, |key| async move { Ok::<_, FakeError>(key * 10) })
            .await;

        assert_eq!(report.into_loaded(), vec![10, 20, 30]);
        // no pause after the last key
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(200); 2]);
    }

    #[tokio::test]
    async fn test_hard_failure_no_retry() {
        let sleeper = Arc::new(InstantSleeper::new());
        let calls = Mutex::new(HashMap::<u64, u32>::new());
        let report = loader(&sleeper)
            .load_range(3, |key| {
                *calls.lock().unwrap().entry(key).or_default() += 1;
                async move {
                    if key == 2 {
                        Err(FakeError { limited: false })
                    } else {
                        Ok(key)
                    }
                }
            })
            .await;

        assert_eq!(report.loaded(), vec![&1, &3]);
        assert_eq!(report.misses(), vec![(2, &MissReason::Failed("boom".to_string()))]);
        assert_eq!(calls.lock().unwrap()[&2], 1);
        assert_eq!(report.retries_for(2), 0);
    }

    #[tokio::test]
    async fn test_rate_limited_retry_once_then_miss() {
        let sleeper = Arc::new(InstantSleeper::new());
        let report = loader(&sleeper)
            .load_range(1, |_| async { Err::<u64, _>(FakeError { limited: true }) })
            .await;

        assert_eq!(report.retries_for(1), 1);
        assert!(matches!(report.misses()[0].1, MissReason::RateLimited(_)));
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(1000)]);
    }

    #[tokio::test]
    async fn test_one_hard_failure_in_ten() {
        let sleeper = Arc::new(InstantSleeper::new());
        let calls = Mutex::new(HashMap::<u64, u32>::new());
        let report = loader(&sleeper)
            .load_range(10, |key| {
                *calls.lock().unwrap().entry(key).or_default() += 1;
                async move {
                    if key == 5 {
                        Err(FakeError { limited: false })
                    } else {
                        Ok(key)
                    }
                }
            })
            .await;

        assert_eq!(report.entries.len(), 10);
        assert_eq!(report.loaded().len(), 9);
        assert_eq!(report.misses(), vec![(5, &MissReason::Failed("boom".to_string()))]);
        assert_eq!(report.entries.iter().map(|e| e.retries).sum::<u32>(), 0);
        assert!(calls.lock().unwrap().values().all(|&n| n == 1));
        assert_eq!(sleeper.waits(), vec![Duration::from_millis(200); 8]);
    }

    #[tokio::test]
    async fn test_rate_limited_once_then_loaded() {
        let sleeper = Arc::new(InstantSleeper::new());
        let calls = Mutex::new(HashMap::<u64, u32>::new());
        let report = loader(&sleeper)
            .load_range(10, |key| {
                let attempt = {
                    let mut calls = calls.lock().unwrap();
                    let n = calls.entry(key).or_default();
                    *n += 1;
                    *n
                };
                async move {
                    if key == 3 && attempt == 1 {
                        Err(FakeError { limited: true })
                    } else {
                        Ok(key)
                    }
                }
            })
            .await;

        assert_eq!(report.retries_for(3), 1);
        assert_eq!(report.entries.iter().map(|e| e.retries).sum::<u32>(), 1);
        assert!(report.misses().is_empty());
        assert_eq!(report.into_loaded(), (1..=10).collect::<Vec<u64>>());
        assert_eq!(calls.lock().unwrap()[&3], 2);

        let short = Duration::from_millis(200);
        let mut expected = vec![short, short, Duration::from_millis(1000)];
        expected.extend([short; 6]);
        assert_eq!(sleeper.waits(), expected);
    }

    #[tokio::test]
    async fn test_load_keys_in_given_order() {
        let sleeper = Arc::new(InstantSleeper::new());
        let report = loader(&sleeper)
            .load_keys(&[9, 4, 7], |key| async move { Ok::<_, FakeError>(key) })
            .await;
        assert_eq!(report.into_loaded(), vec![9, 4, 7]);
        assert_eq!(sleeper.waits().len(), 2);
    }

    #[tokio::test]
    async fn test_load_empty_range() {
        let sleeper = Arc::new(InstantSleeper::new());
        let report = loader(&sleeper)
            .load_range(0, |key| async move { Ok::<_, FakeError>(key) })
            .await;
        assert!(report.entries.is_empty());
        assert!(sleeper.waits().is_empty());
    }
}
