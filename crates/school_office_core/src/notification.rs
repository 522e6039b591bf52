//! crates/school_office_core/src/notification.rs
//!
//! Turns operation results into user-facing notifications. Every outcome,
//! successful or not, goes through here so the wording stays uniform.

use crate::batch::BatchOutcome;
use crate::errors::{ClassifiedError, ErrorSeverity};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    /// Whether offering "try again" makes sense.
    pub retryable: bool,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            message: message.into(),
            retryable: false,
        }
    }

    pub fn from_error(error: &ClassifiedError) -> Self {
        let level = if error.severity >= ErrorSeverity::High {
            NotificationLevel::Error
        } else {
            NotificationLevel::Warning
        };
        let message = if error.message.trim().is_empty() {
            ClassifiedError::default_message(error.category).to_string()
        } else {
            error.message.clone()
        };
        Self {
            level,
            title: title_for(error),
            message,
            retryable: error.is_retryable,
        }
    }

    pub fn from_batch(outcome: &BatchOutcome) -> Self {
        match outcome {
            BatchOutcome::Completed { created } => Self::success(
                "Obligations created",
                format!("Created {} payment obligation(s).", created.len()),
            ),
            BatchOutcome::PartiallyCompleted { created, failed } => Self {
                level: NotificationLevel::Warning,
                title: "Some obligations were not created".to_string(),
                message: format!(
                    "Created {} obligation(s); failed for: {}.",
                    created.len(),
                    join_names(failed.iter().map(|f| f.student_name.as_str()))
                ),
                retryable: false,
            },
            BatchOutcome::Failed { failed } if failed.is_empty() => Self {
                level: NotificationLevel::Info,
                title: "Nothing to create".to_string(),
                message: "No students were selected.".to_string(),
                retryable: false,
            },
            BatchOutcome::Failed { failed } => Self {
                level: NotificationLevel::Error,
                title: "No obligations were created".to_string(),
                message: format!(
                    "Failed for: {}.",
                    join_names(failed.iter().map(|f| f.student_name.as_str()))
                ),
                retryable: false,
            },
        }
    }
}

fn title_for(error: &ClassifiedError) -> String {
    use crate::errors::ErrorCategory::*;
    let title = match error.category {
        Validation => "Invalid input",
        Authentication => "Not signed in",
        Authorization => "Not allowed",
        NotFound => "Not found",
        Conflict => "Conflict",
        ServerError => "Server error",
        Network => "Connection problem",
        Unknown => "Unexpected error",
    };
    title.to_string()
}

fn join_names<'a>(names: impl Iterator<Item = &'a str>) -> String {
    names.collect::<Vec<_>>().join(", ")
}
