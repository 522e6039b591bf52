#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use school_office_core::ports::{Clock, KeyValueStore, PortError, PortResult};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// In-memory store whose writes can be switched off to simulate an outage.
#[derive(Default)]
pub struct TestStore {
    entries: Mutex<HashMap<String, String>>,
    failing: AtomicBool,
}

impl TestStore {
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }
}

#[async_trait]
impl KeyValueStore for TestStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PortError::Unavailable("store is offline".to_string()));
        }
        self.entries.lock().unwrap().insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// A clock that only moves when told to.
pub struct TestClock(Mutex<DateTime<Utc>>);

impl TestClock {
    pub fn at(y: i32, m: u32, d: u32) -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()))
    }

    pub fn set(&self, y: i32, m: u32, d: u32) {
        *self.0.lock().unwrap() = Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}
