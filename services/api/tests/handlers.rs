use api_lib::adapters::MemoryStore;
use api_lib::web::{homework, lessons, obligations, AppState};
use async_trait::async_trait;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, TimeZone, Utc};
use school_office_core::ports::{keys, Clock, KeyValueStore, PortError, PortResult, SystemClock};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// A clock the test moves by hand.
struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn at(y: i32, m: u32, d: u32) -> Self {
        Self(Mutex::new(Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap()))
    }

    fn set(&self, y: i32, m: u32, d: u32) {
        *self.0.lock().unwrap() = Utc.with_ymd_and_hms(y, m, d, 10, 0, 0).unwrap();
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

/// Refuses writes to the homework collection while `homework_down` is set.
#[derive(Default)]
struct HomeworkOutageStore {
    inner: MemoryStore,
    homework_down: AtomicBool,
}

#[async_trait]
impl KeyValueStore for HomeworkOutageStore {
    async fn get(&self, key: &str) -> PortResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> PortResult<()> {
        if key == keys::HOMEWORK_ASSIGNMENTS && self.homework_down.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("disk full".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> PortResult<()> {
        self.inner.remove(key).await
    }
}

async fn state() -> Arc<AppState> {
    let state = AppState::load(Arc::new(MemoryStore::new()), Arc::new(SystemClock))
        .await
        .unwrap();
    Arc::new(state)
}

fn body<T: DeserializeOwned>(value: Value) -> Json<T> {
    Json(serde_json::from_value(value).unwrap())
}

fn obligation_body(student_id: &str, name: &str, amount: &str) -> Value {
    json!({
        "studentId": student_id,
        "studentName": name,
        "type": "tuition",
        "amount": amount,
        "dueDate": "2099-01-31",
        "period": "2099-01"
    })
}

fn lesson_body(student_id: &str, teacher_id: &str, date: &str, start: &str, end: &str) -> Value {
    json!({
        "studentId": student_id,
        "studentName": format!("Student {}", student_id),
        "teacherId": teacher_id,
        "teacherName": format!("Teacher {}", teacher_id),
        "date": date,
        "startTime": start,
        "endTime": end
    })
}

#[tokio::test]
async fn obligation_lifecycle_over_http_handlers() {
    let state = state().await;

    let (status, Json(created)) = obligations::create_obligation(
        State(state.clone()),
        body(obligation_body("s-1", "Ana", "100")),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.status.as_str(), "pending");

    let payment = json!({ "amount": "40", "paymentDate": "2026-10-01", "method": "cash" });
    let (_, Json(partial)) =
        obligations::record_payment(State(state.clone()), Path(created.id), body(payment))
            .await
            .unwrap();
    assert_eq!(partial.status.as_str(), "partial");
    assert_eq!(partial.remaining.to_string(), "60");

    let payment = json!({ "amount": "60", "paymentDate": "2026-10-02", "method": "bank_transfer" });
    let (_, Json(paid)) =
        obligations::record_payment(State(state.clone()), Path(created.id), body(payment))
            .await
            .unwrap();
    assert_eq!(paid.status.as_str(), "paid");

    let Json(summary) = obligations::obligation_summary(State(state.clone())).await.unwrap();
    assert_eq!(summary.counts.paid, 1);

    let first_payment = paid.payments[0].id;
    let Json(reverted) =
        obligations::delete_payment(State(state.clone()), Path((created.id, first_payment)))
            .await
            .unwrap();
    assert_eq!(reverted.status.as_str(), "partial");

    let query = serde_json::from_value(json!({ "status": "partial" })).unwrap();
    let Json(listed) = obligations::list_obligations(State(state.clone()), Query(query))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let status = obligations::delete_obligation(State(state.clone()), Path(created.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    let missing = obligations::get_obligation(State(state), Path(created.id))
        .await
        .unwrap_err();
    assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_status_filter_is_a_bad_request() {
    let state = state().await;
    let query = serde_json::from_value(json!({ "status": "settled" })).unwrap();
    let err = obligations::list_obligations(State(state), Query(query))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn batch_reports_failures_per_student() {
    let state = state().await;
    let request = json!({
        "students": [
            { "studentId": "s-1", "studentName": "Ana" },
            { "studentName": "No Id" },
            { "studentId": "s-2", "studentName": "Ben" }
        ],
        "obligation": {
            "type": "materials",
            "amount": "25.50",
            "dueDate": "2099-02-01",
            "period": "2099-02"
        }
    });
    let (status, Json(response)) = obligations::create_batch(State(state.clone()), body(request))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.status, "partially_completed");
    assert_eq!(response.created.len(), 2);
    assert_eq!(response.failed.len(), 1);
    assert_eq!(response.failed[0].student_name, "No Id");
    assert_eq!(response.notification.level, "warning");

    let request = json!({
        "students": [{ "studentId": "s-3", "studentName": "Caio" }],
        "obligation": {
            "type": "exam",
            "amount": "0",
            "dueDate": "2099-02-01",
            "period": "2099-02"
        }
    });
    let (status, Json(response)) = obligations::create_batch(State(state), body(request))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.status, "failed");
}

#[tokio::test]
async fn overlapping_lessons_answer_conflict() {
    let state = state().await;
    let (_, Json(first)) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-1", "t-1", "2026-11-02", "10:00:00", "11:00:00")),
    )
    .await
    .unwrap();

    let err = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-2", "t-1", "2026-11-02", "10:30:00", "11:30:00")),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

    let (status, _) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-2", "t-1", "2026-11-02", "11:00:00", "12:00:00")),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(cancelled) = lessons::cancel_lesson(State(state.clone()), Path(first.id))
        .await
        .unwrap();
    assert_eq!(cancelled.status.to_string(), "cancelled");
    let err = lessons::complete_lesson(State(state), Path(first.id))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn lesson_homework_flow() {
    let state = state().await;
    let (_, Json(monday)) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-1", "t-1", "2026-11-02", "09:00:00", "10:00:00")),
    )
    .await
    .unwrap();
    let (_, Json(thursday)) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-1", "t-1", "2026-11-05", "09:00:00", "10:00:00")),
    )
    .await
    .unwrap();

    let (status, _) = homework::assign_homework(
        State(state.clone()),
        Path(monday.id),
        body(json!({ "title": "Past simple worksheet" })),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(previous) = homework::previous_homework(State(state.clone()), Path(thursday.id))
        .await
        .unwrap();
    assert_eq!(previous.unwrap().title, "Past simple worksheet");

    let Json(updated) = homework::record_completion(
        State(state.clone()),
        Path(monday.id),
        body(json!({ "studentId": "s-1", "status": "partial" })),
    )
    .await
    .unwrap();
    assert_eq!(updated.completions.len(), 1);

    let Json(summary) = homework::completion_summary(State(state.clone()), Path(monday.id))
        .await
        .unwrap();
    assert_eq!(summary.partial, 1);
    assert!((summary.completion_rate - 0.5).abs() < 1e-9);

    let Json(trend) = homework::homework_trend(State(state.clone()), Path("s-1".to_string())).await;
    assert_eq!(trend.trend, "insufficient_data");

    let status = lessons::delete_lesson(State(state.clone()), Path(monday.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    let err = homework::get_homework(State(state.clone()), Path(monday.id))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);

    let err = homework::assign_homework(
        State(state),
        Path(Uuid::new_v4()),
        body(json!({ "title": "Orphan" })),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn lesson_billing_over_http_handlers() {
    let state = state().await;
    let (_, Json(lesson)) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-9", "t-2", "2026-12-01", "15:00:00", "16:00:00")),
    )
    .await
    .unwrap();

    let template = json!({
        "type": "private_lesson",
        "amount": "45",
        "dueDate": "2099-12-01",
        "period": "2099-12"
    });
    let Json(billed) =
        lessons::attach_obligation(State(state.clone()), Path(lesson.id), body(template.clone()))
            .await
            .unwrap();
    assert_eq!(billed.payment_obligation.unwrap().status.as_str(), "pending");

    let err = lessons::attach_obligation(State(state.clone()), Path(lesson.id), body(template))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);

    let payment = json!({ "amount": "45", "paymentDate": "2026-12-01", "method": "card" });
    let (_, Json(paid)) =
        lessons::record_lesson_payment(State(state), Path(lesson.id), body(payment))
            .await
            .unwrap();
    let obligation = paid.payment_obligation.unwrap();
    assert_eq!(obligation.status.as_str(), "paid");
    assert_eq!(obligation.payments.len(), 1);
}

#[tokio::test]
async fn reads_report_obligations_that_fell_overdue() {
    let clock = Arc::new(ManualClock::at(2026, 10, 1));
    let state = AppState::load(Arc::new(MemoryStore::new()), clock.clone())
        .await
        .unwrap();
    let state = Arc::new(state);

    let mut request = obligation_body("s-1", "Ana", "100");
    request["dueDate"] = json!("2026-10-31");
    let (_, Json(created)) = obligations::create_obligation(State(state.clone()), body(request))
        .await
        .unwrap();
    assert_eq!(created.status.as_str(), "pending");

    let (_, Json(lesson)) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-2", "t-1", "2026-10-20", "09:00:00", "10:00:00")),
    )
    .await
    .unwrap();
    let template = json!({
        "type": "private_lesson",
        "amount": "45",
        "dueDate": "2026-10-31",
        "period": "2026-10"
    });
    lessons::attach_obligation(State(state.clone()), Path(lesson.id), body(template))
        .await
        .unwrap();

    clock.set(2026, 11, 15);

    let Json(fetched) = obligations::get_obligation(State(state.clone()), Path(created.id))
        .await
        .unwrap();
    assert_eq!(fetched.status.as_str(), "overdue");

    let query = serde_json::from_value(json!({ "status": "overdue" })).unwrap();
    let Json(listed) = obligations::list_obligations(State(state.clone()), Query(query))
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);

    let Json(summary) = obligations::obligation_summary(State(state.clone()))
        .await
        .unwrap();
    assert_eq!(summary.counts.overdue, 1);
    assert_eq!(summary.counts.pending, 0);

    let Json(billed) = lessons::get_lesson(State(state), Path(lesson.id))
        .await
        .unwrap();
    assert_eq!(billed.payment_obligation.unwrap().status.as_str(), "overdue");
}

#[tokio::test]
async fn deleting_a_lesson_succeeds_when_its_homework_cannot_be_saved() {
    let store = Arc::new(HomeworkOutageStore::default());
    let state = AppState::load(store.clone(), Arc::new(SystemClock))
        .await
        .unwrap();
    let state = Arc::new(state);

    let (_, Json(lesson)) = lessons::create_lesson(
        State(state.clone()),
        body(lesson_body("s-1", "t-1", "2026-11-02", "09:00:00", "10:00:00")),
    )
    .await
    .unwrap();
    homework::assign_homework(
        State(state.clone()),
        Path(lesson.id),
        body(json!({ "title": "Irregular verbs" })),
    )
    .await
    .unwrap();

    store.homework_down.store(true, Ordering::SeqCst);
    let status = lessons::delete_lesson(State(state.clone()), Path(lesson.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = lessons::get_lesson(State(state.clone()), Path(lesson.id))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    let err = homework::get_homework(State(state), Path(lesson.id))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    assert!(store.inner.get(keys::HOMEWORK_ASSIGNMENTS).await.unwrap().is_some());
}
