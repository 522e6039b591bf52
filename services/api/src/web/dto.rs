//! services/api/src/web/dto.rs
//!
//! Request and response payloads of the REST API. Domain enums travel as
//! their snake_case strings; money travels as decimal strings.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use school_office_core::batch::{BatchFailure, BatchOutcome};
use school_office_core::homework::CompletionSummary;
use school_office_core::ledger::{LedgerSummary, ObligationChanges, ObligationFilter};
use school_office_core::lessons::{LessonChanges, LessonFilter};
use school_office_core::notification::{Notification, NotificationLevel};
use school_office_core::services::StudentTrend;
use school_office_core::status::balance;
use school_office_core::{
    CompletionStatus, HomeworkAssignment, HomeworkCompletion, HomeworkDraft, LessonDraft,
    LessonStatus, NewPayment, ObligationAccount, ObligationStatus, ObligationTemplate,
    ObligationType, PaymentMethod, PaymentObligation, PaymentRecord, PrivateLesson,
    StudentSelection,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

/// Maps an optional text field from an update body: absent leaves the field
/// alone, an empty string clears it.
fn clearable(value: Option<String>) -> Option<Option<String>> {
    value.map(|v| if v.trim().is_empty() { None } else { Some(v) })
}

//=========================================================================================
// Notifications
//=========================================================================================

/// A user-facing message describing the outcome of a request.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationView {
    /// One of `success`, `info`, `warning`, `error`.
    pub level: String,
    pub title: String,
    pub message: String,
    pub retryable: bool,
}

impl From<Notification> for NotificationView {
    fn from(n: Notification) -> Self {
        let level = match n.level {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        };
        Self {
            level: level.to_string(),
            title: n.title,
            message: n.message,
            retryable: n.retryable,
        }
    }
}

//=========================================================================================
// Obligations
//=========================================================================================

/// The shared part of every obligation: what is billed, how much and when.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObligationTemplateRequest {
    #[serde(rename = "type")]
    #[schema(value_type = String, example = "tuition")]
    pub obligation_type: ObligationType,
    #[schema(value_type = String, example = "150.00")]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    #[schema(example = "2026-10")]
    pub period: String,
    pub notes: Option<String>,
}

impl From<ObligationTemplateRequest> for ObligationTemplate {
    fn from(r: ObligationTemplateRequest) -> Self {
        ObligationTemplate {
            obligation_type: r.obligation_type,
            amount: r.amount,
            due_date: r.due_date,
            period: r.period,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateObligationRequest {
    pub student_id: String,
    pub student_name: String,
    #[serde(flatten)]
    pub template: ObligationTemplateRequest,
}

/// Fields to change on an obligation. Omitted fields stay as they are; an
/// empty `notes` clears the notes.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateObligationRequest {
    pub student_name: Option<String>,
    #[serde(rename = "type")]
    #[schema(value_type = Option<String>)]
    pub obligation_type: Option<ObligationType>,
    #[schema(value_type = Option<String>)]
    pub amount: Option<Decimal>,
    pub due_date: Option<NaiveDate>,
    pub period: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateObligationRequest> for ObligationChanges {
    fn from(r: UpdateObligationRequest) -> Self {
        ObligationChanges {
            student_name: r.student_name,
            obligation_type: r.obligation_type,
            amount: r.amount,
            due_date: r.due_date,
            period: r.period,
            notes: clearable(r.notes),
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StudentSelectionRequest {
    pub student_id: Option<String>,
    pub student_name: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchObligationRequest {
    pub students: Vec<StudentSelectionRequest>,
    pub obligation: ObligationTemplateRequest,
}

impl BatchObligationRequest {
    pub fn selections(&self) -> Vec<StudentSelection> {
        self.students
            .iter()
            .map(|s| StudentSelection {
                student_id: s.student_id.clone(),
                student_name: s.student_name.clone(),
            })
            .collect()
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ObligationQuery {
    pub student_id: Option<String>,
    /// One of `pending`, `partial`, `paid`, `overdue`.
    pub status: Option<String>,
}

impl ObligationQuery {
    pub fn into_filter(self) -> Result<ObligationFilter, String> {
        let status = self
            .status
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(str::parse::<ObligationStatus>)
            .transpose()?;
        Ok(ObligationFilter {
            student_id: self.student_id,
            status,
        })
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[schema(value_type = String, example = "40.00")]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[schema(value_type = String, example = "cash")]
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

impl From<PaymentRequest> for NewPayment {
    fn from(r: PaymentRequest) -> Self {
        NewPayment {
            amount: r.amount,
            payment_date: r.payment_date,
            method: r.method,
            notes: r.notes,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentView {
    pub id: Uuid,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    #[schema(value_type = String)]
    pub method: PaymentMethod,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&PaymentRecord> for PaymentView {
    fn from(p: &PaymentRecord) -> Self {
        Self {
            id: p.id,
            amount: p.amount,
            payment_date: p.payment_date,
            method: p.method,
            notes: p.notes.clone(),
            created_at: p.created_at,
        }
    }
}

/// An obligation with its payments and running balance.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ObligationView {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "type")]
    #[schema(value_type = String)]
    pub obligation_type: ObligationType,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub period: String,
    #[schema(value_type = String)]
    pub status: ObligationStatus,
    pub notes: Option<String>,
    #[schema(value_type = String)]
    pub total_paid: Decimal,
    #[schema(value_type = String)]
    pub remaining: Decimal,
    pub payments: Vec<PaymentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ObligationView {
    pub fn new(obligation: &PaymentObligation, payments: &[PaymentRecord]) -> Self {
        let balance = balance(obligation.amount, payments);
        Self {
            id: obligation.id,
            student_id: obligation.student_id.clone(),
            student_name: obligation.student_name.clone(),
            obligation_type: obligation.obligation_type,
            amount: obligation.amount,
            due_date: obligation.due_date,
            period: obligation.period.clone(),
            status: obligation.status,
            notes: obligation.notes.clone(),
            total_paid: balance.total_paid,
            remaining: balance.remaining,
            payments: payments.iter().map(PaymentView::from).collect(),
            created_at: obligation.created_at,
            updated_at: obligation.updated_at,
        }
    }
}

impl From<&ObligationAccount> for ObligationView {
    fn from(a: &ObligationAccount) -> Self {
        Self::new(&a.obligation, &a.payments)
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCountsView {
    pub pending: usize,
    pub partial: usize,
    pub paid: usize,
    pub overdue: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSummaryView {
    #[schema(value_type = String)]
    pub total_due: Decimal,
    #[schema(value_type = String)]
    pub total_collected: Decimal,
    #[schema(value_type = String)]
    pub outstanding: Decimal,
    pub counts: StatusCountsView,
}

impl From<LedgerSummary> for LedgerSummaryView {
    fn from(s: LedgerSummary) -> Self {
        Self {
            total_due: s.total_due,
            total_collected: s.total_collected,
            outstanding: s.outstanding,
            counts: StatusCountsView {
                pending: s.counts.pending,
                partial: s.counts.partial,
                paid: s.counts.paid,
                overdue: s.counts.overdue,
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchFailureView {
    pub student_id: Option<String>,
    pub student_name: String,
    pub reason: String,
}

impl From<&BatchFailure> for BatchFailureView {
    fn from(f: &BatchFailure) -> Self {
        Self {
            student_id: f.student_id.clone(),
            student_name: f.student_name.clone(),
            reason: f.reason.clone(),
        }
    }
}

/// The result of a batch assignment, one entry per selected student.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchResponse {
    /// One of `completed`, `partially_completed`, `failed`.
    pub status: String,
    pub created: Vec<ObligationView>,
    pub failed: Vec<BatchFailureView>,
    pub notification: NotificationView,
}

impl From<&BatchOutcome> for BatchResponse {
    fn from(outcome: &BatchOutcome) -> Self {
        let status = match outcome {
            BatchOutcome::Completed { .. } => "completed",
            BatchOutcome::PartiallyCompleted { .. } => "partially_completed",
            BatchOutcome::Failed { .. } => "failed",
        };
        Self {
            status: status.to_string(),
            created: outcome
                .created()
                .iter()
                .map(|o| ObligationView::new(o, &[]))
                .collect(),
            failed: outcome.failed().iter().map(BatchFailureView::from).collect(),
            notification: Notification::from_batch(outcome).into(),
        }
    }
}

//=========================================================================================
// Lessons
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonRequest {
    pub student_id: String,
    pub student_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "10:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "11:00:00")]
    pub end_time: NaiveTime,
    pub classroom_id: Option<String>,
    pub notes: Option<String>,
}

impl From<LessonRequest> for LessonDraft {
    fn from(r: LessonRequest) -> Self {
        LessonDraft {
            student_id: r.student_id,
            student_name: r.student_name,
            teacher_id: r.teacher_id,
            teacher_name: r.teacher_name,
            date: r.date,
            start_time: r.start_time,
            end_time: r.end_time,
            classroom_id: r.classroom_id,
            notes: r.notes,
        }
    }
}

/// Fields to change on a scheduled lesson. Empty `classroomId` or `notes` clear them.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLessonRequest {
    pub teacher_id: Option<String>,
    pub teacher_name: Option<String>,
    pub date: Option<NaiveDate>,
    #[schema(value_type = Option<String>)]
    pub start_time: Option<NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub end_time: Option<NaiveTime>,
    pub classroom_id: Option<String>,
    pub notes: Option<String>,
}

impl From<UpdateLessonRequest> for LessonChanges {
    fn from(r: UpdateLessonRequest) -> Self {
        LessonChanges {
            teacher_id: r.teacher_id,
            teacher_name: r.teacher_name,
            date: r.date,
            start_time: r.start_time,
            end_time: r.end_time,
            classroom_id: clearable(r.classroom_id),
            notes: clearable(r.notes),
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LessonQuery {
    pub student_id: Option<String>,
    pub teacher_id: Option<String>,
    pub date: Option<NaiveDate>,
}

impl From<LessonQuery> for LessonFilter {
    fn from(q: LessonQuery) -> Self {
        LessonFilter {
            student_id: q.student_id,
            teacher_id: q.teacher_id,
            date: q.date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LessonView {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub classroom_id: Option<String>,
    #[schema(value_type = String)]
    pub status: LessonStatus,
    pub notes: Option<String>,
    pub payment_obligation: Option<ObligationView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&PrivateLesson> for LessonView {
    fn from(l: &PrivateLesson) -> Self {
        Self {
            id: l.id,
            student_id: l.student_id.clone(),
            student_name: l.student_name.clone(),
            teacher_id: l.teacher_id.clone(),
            teacher_name: l.teacher_name.clone(),
            date: l.date,
            start_time: l.start_time,
            end_time: l.end_time,
            classroom_id: l.classroom_id.clone(),
            status: l.status,
            notes: l.notes.clone(),
            payment_obligation: l
                .payment_obligation
                .as_ref()
                .map(|o| ObligationView::new(o, &l.payments)),
            created_at: l.created_at,
            updated_at: l.updated_at,
        }
    }
}

//=========================================================================================
// Homework
//=========================================================================================

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkRequest {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}

impl From<HomeworkRequest> for HomeworkDraft {
    fn from(r: HomeworkRequest) -> Self {
        HomeworkDraft {
            title: r.title,
            description: r.description,
            due_date: r.due_date,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    pub student_id: String,
    /// One of `completed`, `partial`, `not_done`.
    #[schema(value_type = String, example = "completed")]
    pub status: CompletionStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionView {
    pub student_id: String,
    #[schema(value_type = String)]
    pub status: CompletionStatus,
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl From<&HomeworkCompletion> for CompletionView {
    fn from(c: &HomeworkCompletion) -> Self {
        Self {
            student_id: c.student_id.clone(),
            status: c.status,
            notes: c.notes.clone(),
            recorded_at: c.recorded_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkView {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub completions: Vec<CompletionView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&HomeworkAssignment> for HomeworkView {
    fn from(a: &HomeworkAssignment) -> Self {
        Self {
            id: a.id,
            lesson_id: a.lesson_id,
            title: a.title.clone(),
            description: a.description.clone(),
            due_date: a.due_date,
            completions: a.completions.iter().map(CompletionView::from).collect(),
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionSummaryView {
    pub total_students: usize,
    pub completed: usize,
    pub partial: usize,
    pub not_done: usize,
    pub completion_rate: f64,
}

impl From<CompletionSummary> for CompletionSummaryView {
    fn from(s: CompletionSummary) -> Self {
        Self {
            total_students: s.total_students,
            completed: s.completed,
            partial: s.partial,
            not_done: s.not_done,
            completion_rate: s.completion_rate,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkTrendView {
    pub student_id: String,
    /// Completion rate per lesson with recorded homework, oldest first.
    pub rates: Vec<f64>,
    /// One of `improving`, `declining`, `stable`, `insufficient_data`.
    pub trend: String,
}

impl From<StudentTrend> for HomeworkTrendView {
    fn from(t: StudentTrend) -> Self {
        Self {
            trend: t.trend.as_str().to_string(),
            student_id: t.student_id,
            rates: t.rates,
        }
    }
}
