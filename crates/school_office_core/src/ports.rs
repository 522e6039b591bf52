//! crates/school_office_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of where collections are persisted or where time comes from.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., files, database).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    /// The backing service is temporarily unreachable; the call may succeed if retried.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Stored data could not be (de)serialized: {0}")]
    Serialization(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl PortError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, PortError::Unavailable(_))
    }
}

impl From<serde_json::Error> for PortError {
    fn from(e: serde_json::Error) -> Self {
        PortError::Serialization(e.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence Keys
//=========================================================================================

pub mod keys {
    pub const PAYMENT_OBLIGATIONS: &str = "paymentObligations";
    pub const PRIVATE_LESSONS: &str = "privateLessons";
    pub const HOMEWORK_ASSIGNMENTS: &str = "homeworkAssignments";
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// A string key-value store holding whole JSON collections.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when nothing was stored under `key`.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    async fn remove(&self, key: &str) -> PortResult<()>;
}

/// Source of the current time, injected so date-dependent statuses are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Loads a JSON array stored under `key`; a missing key is an empty collection.
pub async fn load_collection<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> PortResult<Vec<T>> {
    match store.get(key).await? {
        Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
        _ => Ok(Vec::new()),
    }
}

/// Replaces the JSON array stored under `key`.
pub async fn save_collection<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    items: &[T],
) -> PortResult<()> {
    let raw = serde_json::to_string(items)?;
    store.set(key, raw).await
}
