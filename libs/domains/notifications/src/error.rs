//! Error types for the notifications domain.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type for notification operations.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// Errors that can occur in the notifications domain.
///
/// The variants follow the fault taxonomy of the dispatch pipeline:
/// validation and resolution faults happen before any external call,
/// provider faults mean the transport rejected or was unreachable, and
/// store faults mean the outcome could not be persisted.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Missing or malformed caller input. Never retried.
    #[error("Invalid input: {0}")]
    Validation(String),

    /// Identity lookup failed or returned no usable address.
    #[error("Could not resolve recipient: {0}")]
    Resolution(String),

    /// Notification record not found (or already expired).
    #[error("Notification not found: {0}")]
    NotFound(String),

    /// The transport is misconfigured (bad credentials, missing sender).
    #[error("Email provider configuration error: {0}")]
    ProviderConfig(String),

    /// The transport rejected the message or could not be reached.
    #[error("Email provider error: {0}")]
    Provider(String),

    /// Record persistence failed.
    #[error("Notification store error: {0}")]
    Store(String),

    /// The message left through the transport but the record write
    /// failed afterwards. The external send cannot be undone, so this
    /// carries the provider message id for manual reconciliation.
    #[error("Message delivered (provider id {message_id:?}) but recording failed: {detail}")]
    DeliveredUnrecorded {
        message_id: Option<String>,
        detail: String,
    },

    /// Template rendering error.
    #[error("Template rendering error: {0}")]
    Template(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotificationError {
    /// Machine-readable identifier used in HTTP error bodies and logs.
    pub fn identifier(&self) -> &'static str {
        match self {
            NotificationError::Validation(_) => "VALIDATION",
            NotificationError::Resolution(_) => "RESOLUTION",
            NotificationError::NotFound(_) => "NOT_FOUND",
            NotificationError::ProviderConfig(_) => "PROVIDER_CONFIG",
            NotificationError::Provider(_) => "TRANSPORT",
            NotificationError::Store(_) => "STORE",
            NotificationError::DeliveredUnrecorded { .. } => "DELIVERED_UNRECORDED",
            NotificationError::Template(_) => "TEMPLATE",
            NotificationError::Internal(_) => "INTERNAL",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            NotificationError::Validation(_) | NotificationError::Resolution(_) => {
                StatusCode::BAD_REQUEST
            }
            NotificationError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Standard error response body.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable error identifier for programmatic handling.
    pub error: String,
    /// Human-readable error message.
    pub message: String,
}

impl IntoResponse for NotificationError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let identifier = self.identifier();
        let message = self.to_string();

        match status {
            // Caller errors are expected traffic, not operator signals.
            StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND => {
                tracing::info!(error = identifier, "{}", message);
            }
            _ => {
                tracing::error!(error = identifier, "{}", message);
            }
        }

        let body = Json(ErrorResponse {
            error: identifier.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

impl From<redis::RedisError> for NotificationError {
    fn from(err: redis::RedisError) -> Self {
        NotificationError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for NotificationError {
    fn from(err: serde_json::Error) -> Self {
        NotificationError::Internal(format!("JSON serialization error: {}", err))
    }
}

impl From<handlebars::RenderError> for NotificationError {
    fn from(err: handlebars::RenderError) -> Self {
        NotificationError::Template(err.to_string())
    }
}

impl From<reqwest::Error> for NotificationError {
    fn from(err: reqwest::Error) -> Self {
        NotificationError::Provider(err.to_string())
    }
}
