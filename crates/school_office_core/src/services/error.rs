//! crates/school_office_core/src/services/error.rs
//!
//! The error type returned by every application service. Each variant maps
//! to an HTTP status, which in turn drives classification and notification.

use crate::errors::{ClassifiedError, ErrorCategory};
use crate::homework::HomeworkError;
use crate::ledger::LedgerError;
use crate::lessons::LessonError;
use crate::notification::Notification;
use crate::ports::PortError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),
}

/// A convenience type alias for `Result<T, ServiceError>`.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 422,
            ServiceError::NotFound(_) => 404,
            ServiceError::Conflict(_) => 409,
            ServiceError::Port(PortError::Unavailable(_)) => 503,
            ServiceError::Port(PortError::NotFound(_)) => 404,
            ServiceError::Port(_) => 500,
        }
    }

    pub fn classify(&self) -> ClassifiedError {
        let message = match self {
            // Port details are for the logs, not the user.
            ServiceError::Port(_) => String::new(),
            other => other.to_string(),
        };
        ClassifiedError::from_status(Some(self.status_code()), message)
    }

    pub fn category(&self) -> ErrorCategory {
        self.classify().category
    }

    pub fn notification(&self) -> Notification {
        Notification::from_error(&self.classify())
    }
}

impl From<LedgerError> for ServiceError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::ObligationNotFound(_) | LedgerError::PaymentNotFound { .. } => {
                ServiceError::NotFound(e.to_string())
            }
            LedgerError::Validation(_) => ServiceError::Validation(e.to_string()),
        }
    }
}

impl From<LessonError> for ServiceError {
    fn from(e: LessonError) -> Self {
        match e {
            LessonError::NotFound(_) | LessonError::PaymentNotFound { .. } => {
                ServiceError::NotFound(e.to_string())
            }
            LessonError::Validation(_) | LessonError::NoObligation(_) => {
                ServiceError::Validation(e.to_string())
            }
            LessonError::Conflict { .. }
            | LessonError::ObligationExists(_)
            | LessonError::InvalidTransition { .. } => ServiceError::Conflict(e.to_string()),
        }
    }
}

impl From<HomeworkError> for ServiceError {
    fn from(e: HomeworkError) -> Self {
        match e {
            HomeworkError::NotFound(_) => ServiceError::NotFound(e.to_string()),
            HomeworkError::AlreadyAssigned(_) => ServiceError::Conflict(e.to_string()),
            HomeworkError::Validation(_) => ServiceError::Validation(e.to_string()),
        }
    }
}
