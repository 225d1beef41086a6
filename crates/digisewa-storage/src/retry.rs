//! Bounded read retry decorator.
//!
//! Gateway reads are flaky right after a pin propagates, so `get` retries a
//! bounded number of times with a fixed delay before surfacing the error.
//! `put` passes through untouched: the write path has no retry policy, and
//! the ingest pipeline treats its failure as fatal.

use crate::traits::{ContentAddress, ContentStore, PutMetadata, StorageError, StorageResult};
use async_trait::async_trait;
use std::time::Duration;

/// Fixed-delay retry policy for the read path.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            delay: Duration::from_millis(500),
        }
    }
}

/// Decorator applying `RetryPolicy` to an inner store's `get`.
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: ContentStore> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        RetryingStore { inner, policy }
    }
}

#[async_trait]
impl<S: ContentStore> ContentStore for RetryingStore<S> {
    async fn put(&self, data: Vec<u8>, metadata: PutMetadata) -> StorageResult<ContentAddress> {
        self.inner.put(data, metadata).await
    }

    async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_err = None;

        for attempt in 1..=max_attempts {
            match self.inner.get(address).await {
                Ok(data) => return Ok(data),
                // A missing blob will not appear by waiting
                Err(StorageError::NotFound(msg)) => return Err(StorageError::NotFound(msg)),
                Err(StorageError::InvalidAddress(msg)) => {
                    return Err(StorageError::InvalidAddress(msg))
                }
                Err(e) => {
                    tracing::warn!(
                        address = %address,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        error = %e,
                        "Blob fetch failed"
                    );
                    last_err = Some(e);
                    if attempt < max_attempts {
                        tokio::time::sleep(self.policy.delay).await;
                    }
                }
            }
        }

        Err(last_err
            .unwrap_or_else(|| StorageError::Unavailable("Retry loop exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Fails the first `failures` get calls, succeeds afterwards.
    struct FlakyStore {
        failures: u32,
        attempts: AtomicU32,
    }

    impl FlakyStore {
        fn new(failures: u32) -> Self {
            FlakyStore {
                failures,
                attempts: AtomicU32::new(0),
            }
        }

        fn attempts(&self) -> u32 {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ContentStore for FlakyStore {
        async fn put(&self, _data: Vec<u8>, _metadata: PutMetadata) -> StorageResult<ContentAddress> {
            Ok(ContentAddress::new("QmFlaky"))
        }

        async fn get(&self, _address: &ContentAddress) -> StorageResult<Vec<u8>> {
            let n = self.attempts.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(StorageError::Unavailable("gateway timeout".to_string()))
            } else {
                Ok(b"ciphertext".to_vec())
            }
        }
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_succeeds_on_last_attempt() {
        let store = RetryingStore::new(FlakyStore::new(2), fast_policy(3));
        let address = ContentAddress::new("QmTest");

        let data = store.get(&address).await.unwrap();
        assert_eq!(data, b"ciphertext");
        assert_eq!(store.inner.attempts(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_exactly_max_attempts() {
        let store = RetryingStore::new(FlakyStore::new(u32::MAX), fast_policy(3));
        let address = ContentAddress::new("QmTest");

        let err = store.get(&address).await.unwrap_err();
        assert!(matches!(err, StorageError::Unavailable(_)));
        assert_eq!(store.inner.attempts(), 3);
    }

    #[tokio::test]
    async fn test_first_attempt_success_makes_one_call() {
        let store = RetryingStore::new(FlakyStore::new(0), fast_policy(3));
        let address = ContentAddress::new("QmTest");

        store.get(&address).await.unwrap();
        assert_eq!(store.inner.attempts(), 1);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        struct MissingStore {
            attempts: AtomicU32,
        }

        #[async_trait]
        impl ContentStore for MissingStore {
            async fn put(
                &self,
                _data: Vec<u8>,
                _metadata: PutMetadata,
            ) -> StorageResult<ContentAddress> {
                unreachable!()
            }

            async fn get(&self, address: &ContentAddress) -> StorageResult<Vec<u8>> {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                Err(StorageError::NotFound(address.to_string()))
            }
        }

        let store = RetryingStore::new(
            MissingStore {
                attempts: AtomicU32::new(0),
            },
            fast_policy(5),
        );
        let err = store.get(&ContentAddress::new("QmGone")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 1);
    }
}
