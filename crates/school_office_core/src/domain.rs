//! crates/school_office_core/src/domain.rs
//!
//! Defines the core data structures for the school office.
//! These structs carry serde derives because the persisted collections are
//! plain JSON arrays (camelCase fields, snake_case enum values).

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Enumerations
//=========================================================================================

/// The derived payment state of an obligation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationStatus {
    Pending,
    Partial,
    Paid,
    Overdue,
}

impl ObligationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObligationStatus::Pending => "pending",
            ObligationStatus::Partial => "partial",
            ObligationStatus::Paid => "paid",
            ObligationStatus::Overdue => "overdue",
        }
    }
}

impl fmt::Display for ObligationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ObligationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(ObligationStatus::Pending),
            "partial" => Ok(ObligationStatus::Partial),
            "paid" => Ok(ObligationStatus::Paid),
            "overdue" => Ok(ObligationStatus::Overdue),
            other => Err(format!("'{}' is not a valid obligation status", other)),
        }
    }
}

/// What an obligation is billed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObligationType {
    Tuition,
    Registration,
    Materials,
    Exam,
    PrivateLesson,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    BankTransfer,
    Card,
    Online,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl fmt::Display for LessonStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LessonStatus::Scheduled => "scheduled",
            LessonStatus::Completed => "completed",
            LessonStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// How far a student got with a homework assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionStatus {
    Completed,
    Partial,
    NotDone,
}

//=========================================================================================
// Billing Records
//=========================================================================================

/// A billing requirement owed by a student for a specific period.
///
/// `status` is denormalized: it must always equal what the status deriver
/// returns for the payments owned alongside this obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentObligation {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    #[serde(rename = "type")]
    pub obligation_type: ObligationType,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub period: String,
    pub status: ObligationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentObligation {
    /// Builds a fresh, unpaid obligation for one student from a template.
    pub fn from_template(
        student_id: impl Into<String>,
        student_name: impl Into<String>,
        template: &ObligationTemplate,
        now: DateTime<Utc>,
    ) -> Self {
        let status = crate::status::derive_status(
            Decimal::ZERO,
            template.amount,
            template.due_date,
            now.date_naive(),
        );
        Self {
            id: Uuid::new_v4(),
            student_id: student_id.into(),
            student_name: student_name.into(),
            obligation_type: template.obligation_type,
            amount: template.amount,
            due_date: template.due_date,
            period: template.period.clone(),
            status,
            notes: template.notes.clone(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single payment applied against an obligation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The caller-supplied part of a payment; id and timestamp are assigned on record.
#[derive(Debug, Clone, PartialEq)]
pub struct NewPayment {
    pub amount: Decimal,
    pub payment_date: NaiveDate,
    pub method: PaymentMethod,
    pub notes: Option<String>,
}

impl NewPayment {
    pub fn into_record(self, now: DateTime<Utc>) -> PaymentRecord {
        PaymentRecord {
            id: Uuid::new_v4(),
            amount: self.amount,
            payment_date: self.payment_date,
            method: self.method,
            notes: self.notes,
            created_at: now,
        }
    }
}

/// An obligation together with the payments it exclusively owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationAccount {
    pub obligation: PaymentObligation,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
}

/// The shared part of an obligation, used by forms and batch assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObligationTemplate {
    #[serde(rename = "type")]
    pub obligation_type: ObligationType,
    pub amount: Decimal,
    pub due_date: NaiveDate,
    pub period: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A student picked from the roster. Either field may be missing when the
/// roster entry is malformed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentSelection {
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub student_name: Option<String>,
}

impl StudentSelection {
    pub fn new(student_id: impl Into<String>, student_name: impl Into<String>) -> Self {
        Self {
            student_id: Some(student_id.into()),
            student_name: Some(student_name.into()),
        }
    }
}

//=========================================================================================
// Private Lessons
//=========================================================================================

/// A booked one-to-one lesson, carrying its own billing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateLesson {
    pub id: Uuid,
    pub student_id: String,
    pub student_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classroom_id: Option<String>,
    pub status: LessonStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_obligation: Option<PaymentObligation>,
    #[serde(default)]
    pub payments: Vec<PaymentRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The fields needed to book a private lesson.
#[derive(Debug, Clone, PartialEq)]
pub struct LessonDraft {
    pub student_id: String,
    pub student_name: String,
    pub teacher_id: String,
    pub teacher_name: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub classroom_id: Option<String>,
    pub notes: Option<String>,
}

//=========================================================================================
// Homework
//=========================================================================================

/// One student's recorded result for a homework assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkCompletion {
    pub student_id: String,
    pub status: CompletionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

/// Homework given at the end of a lesson; at most one per lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HomeworkAssignment {
    pub id: Uuid,
    pub lesson_id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completions: Vec<HomeworkCompletion>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomeworkDraft {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
}
