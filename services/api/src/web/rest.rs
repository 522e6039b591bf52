//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification and the router that
//! wires every REST handler to its path.

use crate::web::dto::{
    BatchFailureView, BatchObligationRequest, BatchResponse, CompletionRequest,
    CompletionSummaryView, CompletionView, CreateObligationRequest, HomeworkRequest,
    HomeworkTrendView, HomeworkView, LedgerSummaryView, LessonRequest, LessonView,
    NotificationView, ObligationTemplateRequest, ObligationView, PaymentRequest, PaymentView,
    StatusCountsView, StudentSelectionRequest, UpdateLessonRequest, UpdateObligationRequest,
};
use crate::web::middleware::log_requests;
use crate::web::state::AppState;
use crate::web::{homework, lessons, obligations};
use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        obligations::list_obligations,
        obligations::create_obligation,
        obligations::get_obligation,
        obligations::update_obligation,
        obligations::delete_obligation,
        obligations::create_batch,
        obligations::record_payment,
        obligations::delete_payment,
        obligations::obligation_summary,
        lessons::list_lessons,
        lessons::create_lesson,
        lessons::get_lesson,
        lessons::update_lesson,
        lessons::delete_lesson,
        lessons::complete_lesson,
        lessons::cancel_lesson,
        lessons::attach_obligation,
        lessons::record_lesson_payment,
        lessons::delete_lesson_payment,
        homework::get_homework,
        homework::assign_homework,
        homework::update_homework,
        homework::remove_homework,
        homework::previous_homework,
        homework::completion_summary,
        homework::record_completion,
        homework::homework_trend,
    ),
    components(
        schemas(
            NotificationView,
            ObligationTemplateRequest,
            CreateObligationRequest,
            UpdateObligationRequest,
            StudentSelectionRequest,
            BatchObligationRequest,
            PaymentRequest,
            PaymentView,
            ObligationView,
            StatusCountsView,
            LedgerSummaryView,
            BatchFailureView,
            BatchResponse,
            LessonRequest,
            UpdateLessonRequest,
            LessonView,
            HomeworkRequest,
            CompletionRequest,
            CompletionView,
            HomeworkView,
            CompletionSummaryView,
            HomeworkTrendView,
        )
    ),
    tags(
        (name = "Obligations", description = "Payment obligations, payments and batch assignment."),
        (name = "Lessons", description = "Private lessons and their billing."),
        (name = "Homework", description = "Homework per lesson and completion tracking.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Router
//=========================================================================================

/// Builds the REST router over the shared state.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/obligations",
            get(obligations::list_obligations).post(obligations::create_obligation),
        )
        .route("/api/obligations/summary", get(obligations::obligation_summary))
        .route("/api/obligations/batch", post(obligations::create_batch))
        .route(
            "/api/obligations/{id}",
            get(obligations::get_obligation)
                .put(obligations::update_obligation)
                .delete(obligations::delete_obligation),
        )
        .route("/api/obligations/{id}/payments", post(obligations::record_payment))
        .route(
            "/api/obligations/{id}/payments/{paymentId}",
            axum::routing::delete(obligations::delete_payment),
        )
        .route("/api/lessons", get(lessons::list_lessons).post(lessons::create_lesson))
        .route(
            "/api/lessons/{lessonId}",
            get(lessons::get_lesson)
                .put(lessons::update_lesson)
                .delete(lessons::delete_lesson),
        )
        .route("/api/lessons/{lessonId}/complete", post(lessons::complete_lesson))
        .route("/api/lessons/{lessonId}/cancel", post(lessons::cancel_lesson))
        .route("/api/lessons/{lessonId}/obligation", put(lessons::attach_obligation))
        .route("/api/lessons/{lessonId}/payments", post(lessons::record_lesson_payment))
        .route(
            "/api/lessons/{lessonId}/payments/{paymentId}",
            axum::routing::delete(lessons::delete_lesson_payment),
        )
        .route(
            "/api/lessons/{lessonId}/homework-assignment",
            get(homework::get_homework)
                .post(homework::assign_homework)
                .put(homework::update_homework)
                .delete(homework::remove_homework),
        )
        .route(
            "/api/lessons/{lessonId}/previous-homework",
            get(homework::previous_homework),
        )
        .route(
            "/api/lessons/{lessonId}/homework-completion-summary",
            get(homework::completion_summary),
        )
        .route(
            "/api/lessons/{lessonId}/homework-completion",
            put(homework::record_completion),
        )
        .route(
            "/api/students/{studentId}/homework-trend",
            get(homework::homework_trend),
        )
        .layer(axum_middleware::from_fn(log_requests))
        .with_state(state)
}
