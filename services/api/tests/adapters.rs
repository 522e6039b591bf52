use async_trait::async_trait;
use api_lib::adapters::{FileStore, MemoryStore, RetryingStore};
use school_office_core::errors::RetryPolicy;
use school_office_core::ports::{keys, load_collection, KeyValueStore, PortError, PortResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use uuid::Uuid;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        base_delay_ms: 1,
        max_delay_ms: 5,
        backoff_multiplier: 2.0,
        jitter: true,
    }
}

/// Fails the first `failures` calls with the given error kind.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
    calls: AtomicU32,
    retryable: bool,
}

impl FlakyStore {
    fn new(failures: u32, retryable: bool) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures: AtomicU32::new(failures),
            calls: AtomicU32::new(0),
            retryable,
        }
    }

    fn trip(&self) -> PortResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let left = self.failures.load(Ordering::SeqCst);
        if left == 0 {
            return Ok(());
        }
        self.failures.store(left - 1, Ordering::SeqCst);
        if self.retryable {
            Err(PortError::Unavailable("connection reset".to_string()))
        } else {
            Err(PortError::Unexpected("disk full".to_string()))
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.trip()?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        self.trip()?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.trip()?;
        self.inner.remove(key).await
    }
}

#[tokio::test]
async fn memory_store_round_trips_and_removes() {
    let store = MemoryStore::new();
    assert_eq!(store.get("k").await.unwrap(), None);
    store.set("k", "[1,2]".to_string()).await.unwrap();
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("[1,2]"));
    store.remove("k").await.unwrap();
    assert_eq!(store.get("k").await.unwrap(), None);
}

#[tokio::test]
async fn file_store_persists_across_instances() {
    let dir = std::env::temp_dir().join(format!("school-office-{}", Uuid::new_v4()));
    let store = FileStore::open(&dir).await.unwrap();

    assert_eq!(store.get(keys::PRIVATE_LESSONS).await.unwrap(), None);
    let empty: Vec<serde_json::Value> =
        load_collection(&store, keys::PRIVATE_LESSONS).await.unwrap();
    assert!(empty.is_empty());

    store
        .set(keys::PAYMENT_OBLIGATIONS, "[]".to_string())
        .await
        .unwrap();
    let reopened = FileStore::open(&dir).await.unwrap();
    assert_eq!(
        reopened.get(keys::PAYMENT_OBLIGATIONS).await.unwrap().as_deref(),
        Some("[]")
    );
    assert!(dir.join("paymentObligations.json").exists());

    reopened.remove(keys::PAYMENT_OBLIGATIONS).await.unwrap();
    reopened.remove(keys::PAYMENT_OBLIGATIONS).await.unwrap();
    assert_eq!(reopened.get(keys::PAYMENT_OBLIGATIONS).await.unwrap(), None);

    assert!(reopened.get("../escape").await.is_err());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn retrying_store_recovers_from_transient_failures() {
    let flaky = Arc::new(FlakyStore::new(2, true));
    let store = RetryingStore::new(flaky.clone(), fast_policy(3));

    store.set("k", "v".to_string()).await.unwrap();
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
    assert_eq!(store.get("k").await.unwrap().as_deref(), Some("v"));
}

#[tokio::test]
async fn retrying_store_gives_up_after_max_attempts() {
    let flaky = Arc::new(FlakyStore::new(10, true));
    let store = RetryingStore::new(flaky.clone(), fast_policy(3));

    let err = store.set("k", "v".to_string()).await.unwrap_err();
    assert!(err.is_retryable());
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn retrying_store_does_not_retry_permanent_failures() {
    let flaky = Arc::new(FlakyStore::new(1, false));
    let store = RetryingStore::new(flaky.clone(), fast_policy(5));

    let err = store.set("k", "v".to_string()).await.unwrap_err();
    assert!(matches!(err, PortError::Unexpected(_)));
    assert_eq!(flaky.calls.load(Ordering::SeqCst), 1);
}
