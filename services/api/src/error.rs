//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service.

use crate::config::ConfigError;
use crate::web::dto::NotificationView;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use school_office_core::errors::ClassifiedError;
use school_office_core::notification::Notification;
use school_office_core::ServiceError;
use tracing::error;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error returned by one of the core application services.
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The request could not be understood (bad path or query values).
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        let code = match self {
            ApiError::Service(e) => e.status_code(),
            ApiError::BadRequest(_) => 400,
            _ => 500,
        };
        StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// The notification shown to the user for this error.
    pub fn notification(&self) -> Notification {
        match self {
            ApiError::Service(e) => e.notification(),
            ApiError::BadRequest(message) => {
                Notification::from_error(&ClassifiedError::from_status(Some(400), message.clone()))
            }
            _ => Notification::from_error(&ClassifiedError::from_status(Some(500), String::new())),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(NotificationView::from(self.notification()))).into_response()
    }
}
