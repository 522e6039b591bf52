//! services/api/src/adapters/retrying.rs
//!
//! A `KeyValueStore` decorator that re-attempts calls failing with a
//! retryable `PortError`, waiting out the policy's backoff between attempts.

use async_trait::async_trait;
use rand::Rng;
use school_office_core::errors::{calculate_retry_delay, ClassifiedError, RetryPolicy};
use school_office_core::ports::{KeyValueStore, PortResult};
use std::future::Future;
use std::sync::Arc;
use tracing::warn;

pub struct RetryingStore {
    inner: Arc<dyn KeyValueStore>,
    policy: RetryPolicy,
}

impl RetryingStore {
    pub fn new(inner: Arc<dyn KeyValueStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    async fn run<T, F, Fut>(&self, operation: &str, key: &str, mut call: F) -> PortResult<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = PortResult<T>> + Send,
        T: Send,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Err(e) if e.is_retryable() => {
                    // A retryable port failure means the backend never answered.
                    let classified = ClassifiedError::from_status(None, e.to_string());
                    if !self.policy.should_retry(&classified, attempt) {
                        return Err(e);
                    }
                    let delay = calculate_retry_delay(attempt, &self.policy, jitter_sample());
                    warn!(
                        "{} '{}' failed on attempt {}: {}; retrying in {:?}",
                        operation,
                        key,
                        attempt + 1,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

/// A uniform sample in `[0, 1)`.
fn jitter_sample() -> f64 {
    rand::thread_rng().gen::<f64>()
}

#[async_trait]
impl KeyValueStore for RetryingStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.run("get", key, || self.inner.get(key)).await
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.run("set", key, || self.inner.set(key, value.clone())).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.run("remove", key, || self.inner.remove(key)).await
    }
}
