//! services/api/src/web/homework.rs
//!
//! Handlers for homework assignments, completion tracking and trends.
//! Lesson lookups lock the lesson service before the homework service.

use crate::error::ApiError;
use crate::web::dto::{
    CompletionRequest, CompletionSummaryView, HomeworkRequest, HomeworkTrendView, HomeworkView,
    NotificationView,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/api/lessons/{lessonId}/homework-assignment",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "The lesson's homework", body = HomeworkView),
        (status = 404, description = "No lesson or no homework", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn get_homework(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<HomeworkView>, ApiError> {
    let lessons = state.lessons.lock().await;
    let homework = state.homework.lock().await;
    lessons.get(lesson_id)?;
    let assignment = homework.assignment(lesson_id)?;
    Ok(Json(HomeworkView::from(&assignment)))
}

#[utoipa::path(
    post,
    path = "/api/lessons/{lessonId}/homework-assignment",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    request_body = HomeworkRequest,
    responses(
        (status = 201, description = "Homework assigned", body = HomeworkView),
        (status = 404, description = "No such lesson", body = NotificationView),
        (status = 409, description = "The lesson already has homework", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn assign_homework(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<HomeworkRequest>,
) -> Result<(StatusCode, Json<HomeworkView>), ApiError> {
    let lessons = state.lessons.lock().await;
    let mut homework = state.homework.lock().await;
    let assignment = homework.assign(lessons.book(), lesson_id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(HomeworkView::from(&assignment))))
}

#[utoipa::path(
    put,
    path = "/api/lessons/{lessonId}/homework-assignment",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    request_body = HomeworkRequest,
    responses(
        (status = 200, description = "Homework updated", body = HomeworkView),
        (status = 404, description = "No homework for this lesson", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn update_homework(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<HomeworkRequest>,
) -> Result<Json<HomeworkView>, ApiError> {
    let assignment = state.homework.lock().await.update(lesson_id, body.into()).await?;
    Ok(Json(HomeworkView::from(&assignment)))
}

#[utoipa::path(
    delete,
    path = "/api/lessons/{lessonId}/homework-assignment",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 204, description = "Homework removed"),
        (status = 404, description = "No homework for this lesson", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn remove_homework(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.homework.lock().await.remove(lesson_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The homework given at the same student's previous lesson, or `null`.
#[utoipa::path(
    get,
    path = "/api/lessons/{lessonId}/previous-homework",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Previous homework, if any", body = Option<HomeworkView>),
        (status = 404, description = "No such lesson", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn previous_homework(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<Option<HomeworkView>>, ApiError> {
    let lessons = state.lessons.lock().await;
    let homework = state.homework.lock().await;
    let previous = homework.previous_homework(lessons.book(), lesson_id)?;
    Ok(Json(previous.as_ref().map(HomeworkView::from)))
}

#[utoipa::path(
    get,
    path = "/api/lessons/{lessonId}/homework-completion-summary",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    responses(
        (status = 200, description = "Completion counts and rate", body = CompletionSummaryView),
        (status = 404, description = "No such lesson or no homework", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn completion_summary(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
) -> Result<Json<CompletionSummaryView>, ApiError> {
    let lessons = state.lessons.lock().await;
    let homework = state.homework.lock().await;
    let summary = homework.completion_summary(lessons.book(), lesson_id)?;
    Ok(Json(summary.into()))
}

/// Record how far a student got with the lesson's homework. Recording again
/// replaces the earlier result.
#[utoipa::path(
    put,
    path = "/api/lessons/{lessonId}/homework-completion",
    params(("lessonId" = Uuid, Path, description = "Lesson id")),
    request_body = CompletionRequest,
    responses(
        (status = 200, description = "Completion recorded", body = HomeworkView),
        (status = 404, description = "No such lesson or no homework", body = NotificationView),
        (status = 422, description = "Student not in this lesson", body = NotificationView)
    ),
    tag = "Homework"
)]
pub async fn record_completion(
    State(state): State<Arc<AppState>>,
    Path(lesson_id): Path<Uuid>,
    Json(body): Json<CompletionRequest>,
) -> Result<Json<HomeworkView>, ApiError> {
    let lessons = state.lessons.lock().await;
    let mut homework = state.homework.lock().await;
    let assignment = homework
        .record_completion(lessons.book(), lesson_id, &body.student_id, body.status, body.notes)
        .await?;
    Ok(Json(HomeworkView::from(&assignment)))
}

/// Whether a student's homework completion is improving, declining or stable.
#[utoipa::path(
    get,
    path = "/api/students/{studentId}/homework-trend",
    params(("studentId" = String, Path, description = "Student id")),
    responses(
        (status = 200, description = "Completion history and trend", body = HomeworkTrendView)
    ),
    tag = "Homework"
)]
pub async fn homework_trend(
    State(state): State<Arc<AppState>>,
    Path(student_id): Path<String>,
) -> Json<HomeworkTrendView> {
    let lessons = state.lessons.lock().await;
    let homework = state.homework.lock().await;
    Json(homework.student_trend(lessons.book(), &student_id).into())
}
