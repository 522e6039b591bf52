//! services/api/src/web/obligations.rs
//!
//! Handlers for payment obligations, their payments and batch assignment.

use crate::error::ApiError;
use crate::web::dto::{
    BatchObligationRequest, BatchResponse, CreateObligationRequest, LedgerSummaryView,
    NotificationView, ObligationQuery, ObligationView, PaymentRequest,
    UpdateObligationRequest,
};
use crate::web::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use school_office_core::batch::BatchOutcome;
use school_office_core::ObligationTemplate;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

/// List obligations, optionally narrowed to one student and/or status.
#[utoipa::path(
    get,
    path = "/api/obligations",
    params(ObligationQuery),
    responses(
        (status = 200, description = "Matching obligations", body = [ObligationView]),
        (status = 400, description = "Unknown status filter", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn list_obligations(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ObligationQuery>,
) -> Result<Json<Vec<ObligationView>>, ApiError> {
    let filter = query.into_filter().map_err(ApiError::BadRequest)?;
    let mut finance = state.finance.lock().await;
    finance.refresh_statuses().await?;
    let views = finance.list(&filter).iter().map(ObligationView::from).collect();
    Ok(Json(views))
}

/// Create a single obligation for one student.
#[utoipa::path(
    post,
    path = "/api/obligations",
    request_body = CreateObligationRequest,
    responses(
        (status = 201, description = "Obligation created", body = ObligationView),
        (status = 422, description = "Invalid obligation", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn create_obligation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateObligationRequest>,
) -> Result<(StatusCode, Json<ObligationView>), ApiError> {
    let template = ObligationTemplate::from(body.template);
    let mut finance = state.finance.lock().await;
    let account = finance
        .create_obligation(&body.student_id, &body.student_name, &template)
        .await?;
    Ok((StatusCode::CREATED, Json(ObligationView::from(&account))))
}

#[utoipa::path(
    get,
    path = "/api/obligations/{id}",
    params(("id" = Uuid, Path, description = "Obligation id")),
    responses(
        (status = 200, description = "The obligation", body = ObligationView),
        (status = 404, description = "No such obligation", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn get_obligation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ObligationView>, ApiError> {
    let mut finance = state.finance.lock().await;
    finance.refresh_statuses().await?;
    let account = finance.get(id)?;
    Ok(Json(ObligationView::from(&account)))
}

/// Edit an obligation. Its status is re-derived from the payments afterwards.
#[utoipa::path(
    put,
    path = "/api/obligations/{id}",
    params(("id" = Uuid, Path, description = "Obligation id")),
    request_body = UpdateObligationRequest,
    responses(
        (status = 200, description = "Obligation updated", body = ObligationView),
        (status = 404, description = "No such obligation", body = NotificationView),
        (status = 422, description = "Invalid change", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn update_obligation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateObligationRequest>,
) -> Result<Json<ObligationView>, ApiError> {
    let mut finance = state.finance.lock().await;
    let account = finance.update_obligation(id, body.into()).await?;
    Ok(Json(ObligationView::from(&account)))
}

/// Delete an obligation together with its payments.
#[utoipa::path(
    delete,
    path = "/api/obligations/{id}",
    params(("id" = Uuid, Path, description = "Obligation id")),
    responses(
        (status = 204, description = "Obligation deleted"),
        (status = 404, description = "No such obligation", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn delete_obligation(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.finance.lock().await.delete_obligation(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Assign the same obligation to many students at once.
///
/// Students are handled independently: the response lists who was billed
/// and who was not, and why. Answers 201 when at least one obligation was
/// created and 422 when none were.
#[utoipa::path(
    post,
    path = "/api/obligations/batch",
    request_body = BatchObligationRequest,
    responses(
        (status = 201, description = "Some or all obligations created", body = BatchResponse),
        (status = 422, description = "No obligation could be created", body = BatchResponse)
    ),
    tag = "Obligations"
)]
pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BatchObligationRequest>,
) -> Result<(StatusCode, Json<BatchResponse>), ApiError> {
    let students = body.selections();
    let template = ObligationTemplate::from(body.obligation);
    let outcome = state
        .finance
        .lock()
        .await
        .create_batch(&students, &template)
        .await?;

    let status = match outcome {
        BatchOutcome::Failed { .. } => {
            warn!("Batch assignment created no obligations");
            StatusCode::UNPROCESSABLE_ENTITY
        }
        _ => StatusCode::CREATED,
    };
    Ok((status, Json(BatchResponse::from(&outcome))))
}

/// Record a payment against an obligation.
#[utoipa::path(
    post,
    path = "/api/obligations/{id}/payments",
    params(("id" = Uuid, Path, description = "Obligation id")),
    request_body = PaymentRequest,
    responses(
        (status = 201, description = "Payment recorded", body = ObligationView),
        (status = 404, description = "No such obligation", body = NotificationView),
        (status = 422, description = "Invalid payment", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn record_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<ObligationView>), ApiError> {
    let mut finance = state.finance.lock().await;
    let account = finance.record_payment(id, body.into()).await?;
    Ok((StatusCode::CREATED, Json(ObligationView::from(&account))))
}

#[utoipa::path(
    delete,
    path = "/api/obligations/{id}/payments/{paymentId}",
    params(
        ("id" = Uuid, Path, description = "Obligation id"),
        ("paymentId" = Uuid, Path, description = "Payment id")
    ),
    responses(
        (status = 200, description = "Payment removed", body = ObligationView),
        (status = 404, description = "No such obligation or payment", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn delete_payment(
    State(state): State<Arc<AppState>>,
    Path((id, payment_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<ObligationView>, ApiError> {
    let mut finance = state.finance.lock().await;
    let account = finance.delete_payment(id, payment_id).await?;
    Ok(Json(ObligationView::from(&account)))
}

/// Totals due, collected and outstanding across every obligation.
#[utoipa::path(
    get,
    path = "/api/obligations/summary",
    responses(
        (status = 200, description = "Ledger totals", body = LedgerSummaryView),
        (status = 503, description = "Storage unavailable", body = NotificationView)
    ),
    tag = "Obligations"
)]
pub async fn obligation_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<LedgerSummaryView>, ApiError> {
    let mut finance = state.finance.lock().await;
    finance.refresh_statuses().await?;
    Ok(Json(finance.summary().into()))
}

