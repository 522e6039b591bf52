//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use school_office_core::ports::{Clock, KeyValueStore};
use school_office_core::{FinanceService, HomeworkService, LessonService, ServiceResult};
use std::sync::Arc;
use tokio::sync::Mutex;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Each service owns one collection and is its only writer; the mutexes
/// serialize mutations. Handlers that need both lessons and homework lock
/// `lessons` first.
pub struct AppState {
    pub finance: Mutex<FinanceService>,
    pub lessons: Mutex<LessonService>,
    pub homework: Mutex<HomeworkService>,
}

impl AppState {
    /// Loads every collection from `store`, refreshing statuses against `clock`.
    pub async fn load(store: Arc<dyn KeyValueStore>, clock: Arc<dyn Clock>) -> ServiceResult<Self> {
        let finance = FinanceService::load(store.clone(), clock.clone()).await?;
        let lessons = LessonService::load(store.clone(), clock.clone()).await?;
        let homework = HomeworkService::load(store, clock).await?;
        Ok(Self {
            finance: Mutex::new(finance),
            lessons: Mutex::new(lessons),
            homework: Mutex::new(homework),
        })
    }
}
