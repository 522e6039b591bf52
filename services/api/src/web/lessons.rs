//! services/api/src/web/lessons.rs
//!
//! Handlers for private lessons and their billing.

use crate::error::ApiError;
use crate::web::dto::{
    LessonQuery, LessonRequest, LessonView, NotificationView, ObligationTemplateRequest,
    PaymentRequest, UpdateLessonRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use school_office_core::lessons::LessonFilter;
use school_office_core::ObligationTemplate;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// List lessons in date order, optionally filtered by student, teacher or day.
#[utoipa::path(
    get,
    path = "/api/lessons",
    params(LessonQuery),
    responses(
        (status = 200, description = "Matching lessons", body = [LessonView]),
        (status = 503, description = "Storage unavailable", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn list_lessons(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LessonQuery>,
) -> Result<Json<Vec<LessonView>>, ApiError> {
    let mut lessons = state.lessons.lock().await;
    lessons.refresh_statuses().await?;
    let views = lessons.list(&LessonFilter::from(query)).iter().map(LessonView::from).collect();
    Ok(Json(views))
}

/// Book a lesson. Rejected with 409 when it overlaps another lesson of the
/// same teacher, student or classroom.
#[utoipa::path(
    post,
    path = "/api/lessons",
    request_body = LessonRequest,
    responses(
        (status = 201, description = "Lesson scheduled", body = LessonView),
        (status = 409, description = "Overlaps an existing lesson", body = NotificationView),
        (status = 422, description = "Invalid lesson", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn create_lesson(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LessonRequest>,
) -> Result<(StatusCode, Json<LessonView>), ApiError> {
    let lesson = state.lessons.lock().await.schedule(body.into()).await?;
    Ok((StatusCode::CREATED, Json(LessonView::from(&lesson))))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lessonId}",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "The lesson", body = LessonView),
        (status = 404, description = "No such lesson", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn get_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonView>, ApiError> {
    let mut lessons = state.lessons.lock().await;
    lessons.refresh_statuses().await?;
    let lesson = lessons.get(lesson_id)?;
    Ok(Json(LessonView::from(&lesson)))
}

/// Reschedule or edit a lesson that has not happened yet.
#[utoipa::path(
    put,
    path = "/api/lessons/{lessonId}",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    request_body = UpdateLessonRequest,
    responses(
        (status = 200, description = "Lesson updated", body = LessonView),
        (status = 404, description = "No such lesson", body = NotificationView),
        (status = 409, description = "Overlap or not scheduled", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn update_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<UpdateLessonRequest>,
) -> Result<Json<LessonView>, ApiError> {
    let lesson = state.lessons.lock().await.update(lesson_id, body.into()).await?;
    Ok(Json(LessonView::from(&lesson)))
}

/// Delete a lesson and the homework given at it.
#[utoipa::path(
    delete,
    path = "/api/lessons/{lessonId}",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 204, description = "Lesson deleted"),
        (status = 404, description = "No such lesson", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn delete_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let mut lessons = state.lessons.lock().await;
    let mut homework = state.homework.lock().await;
    lessons.delete(lesson_id).await?;
    if let Err(e) = homework.forget_lesson(lesson_id).await {
        warn!("Deleted lesson {} but kept its homework: {}", lesson_id, e);
    }
    info!("Deleted lesson {}", lesson_id);
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lessonId}/complete",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson marked as completed", body = LessonView),
        (status = 404, description = "No such lesson", body = NotificationView),
        (status = 409, description = "The lesson is not scheduled", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonView>, ApiError> {
    let lesson = state.lessons.lock().await.complete(lesson_id).await?;
    Ok(Json(LessonView::from(&lesson)))
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lessonId}/cancel",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Lesson cancelled", body = LessonView),
        (status = 404, description = "No such lesson", body = NotificationView),
        (status = 409, description = "The lesson is not scheduled", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn cancel_lesson(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<LessonView>, ApiError> {
    let lesson = state.lessons.lock().await.cancel(lesson_id).await?;
    Ok(Json(LessonView::from(&lesson)))
}

/// Bill the lesson's student. A lesson carries at most one obligation.
#[utoipa::path(
    put,
    path = "/api/lessons/{lessonId}/obligation",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    request_body = ObligationTemplateRequest,
    responses(
        (status = 200, description = "Obligation attached", body = LessonView),
        (status = 404, description = "No such lesson", body = NotificationView),
        (status = 409, description = "The lesson is already billed", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn attach_obligation(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<ObligationTemplateRequest>,
) -> Result<Json<LessonView>, ApiError> {
    let template = ObligationTemplate::from(body);
    let lesson = state
        .lessons
        .lock()
        .await
        .attach_obligation(lesson_id, &template)
        .await?;
    Ok(Json(LessonView::from(&lesson)))
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lessonId}/payments",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = LessonView),
        (status = 404, description = "No such lesson", body = NotificationView),
        (status = 422, description = "Invalid payment or not billed", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn record_lesson_payment(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<LessonView>), ApiError> {
    let lesson = state
        .lessons
        .lock()
        .await
        .record_payment(lesson_id, body.into())
        .await?;
    Ok((StatusCode::CREATED, Json(LessonView::from(&lesson))))
}

#[utoipa::path(
    delete,
    path = "/api/lessons/{lessonId}/payments/{paymentId}",
    params(
        ("lessonId" = Uuid, Path, description = "Lesson id"),
        ("paymentId" = Uuid, Path, description = "Payment id")
    ),
    responses(
        (status = 200, description = "Payment removed", body = LessonView),
        (status = 404, description = "No such lesson or payment", body = NotificationView)
    ),
    tag = "Lessons"
)]
pub async fn delete_lesson_payment(
    State(state): State<Arc<AppState>>,
    Path((lesson_id, payment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LessonView>, ApiError> {
    let lesson = state
        .lessons
        .lock()
        .await
        .delete_payment(lesson_id, payment_id)
        .await?;
    Ok(Json(LessonView::from(&lesson)))
}
