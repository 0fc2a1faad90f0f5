use crate::adapters::{AdapterError, FailureKind};
use crate::audit::ExportError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::portal::PortalError;
use crate::service::AuditServiceError;
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Adapter(AdapterError),
    Checkout(CheckoutError),
    Portal(PortalError),
    Export(ExportError),
    /// Request the funnel refuses to act on, e.g. an empty search or an
    /// unselectable review.
    Rejected(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Adapter(err) => adapter_status(err),
            AppError::Checkout(CheckoutError::Adapter(err)) => adapter_status(err),
            AppError::Checkout(CheckoutError::Busy) => StatusCode::CONFLICT,
            AppError::Checkout(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Portal(PortalError::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Portal(PortalError::NotConfigured) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Portal(_) => StatusCode::BAD_GATEWAY,
            AppError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Text a client can show as-is.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Adapter(err) => err.user_message(),
            AppError::Checkout(err) => err.user_message(),
            AppError::Rejected(reason) => reason.clone(),
            other => other.to_string(),
        }
    }
}

fn adapter_status(err: &AdapterError) -> StatusCode {
    match err.failure_kind() {
        FailureKind::NotFound => StatusCode::NOT_FOUND,
        FailureKind::Transport | FailureKind::BusinessLogic => StatusCode::BAD_GATEWAY,
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Adapter(err) => write!(f, "upstream error: {}", err),
            AppError::Checkout(err) => write!(f, "checkout error: {}", err),
            AppError::Portal(err) => write!(f, "portal error: {}", err),
            AppError::Export(err) => write!(f, "export error: {}", err),
            AppError::Rejected(reason) => write!(f, "request rejected: {}", reason),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Adapter(err) => Some(err),
            AppError::Checkout(err) => Some(err),
            AppError::Portal(err) => Some(err),
            AppError::Export(err) => Some(err),
            AppError::Rejected(_) => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self, %status, "request failed");
        }

        let mut body = json!({ "error": self.user_message() });
        if let AppError::Adapter(err) | AppError::Checkout(CheckoutError::Adapter(err)) = &self {
            body["kind"] = json!(err.failure_kind());
        }
        (status, Json(body)).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<AdapterError> for AppError {
    fn from(value: AdapterError) -> Self {
        Self::Adapter(value)
    }
}

impl From<CheckoutError> for AppError {
    fn from(value: CheckoutError) -> Self {
        Self::Checkout(value)
    }
}

impl From<PortalError> for AppError {
    fn from(value: PortalError) -> Self {
        Self::Portal(value)
    }
}

impl From<ExportError> for AppError {
    fn from(value: ExportError) -> Self {
        Self::Export(value)
    }
}

impl From<AuditServiceError> for AppError {
    fn from(value: AuditServiceError) -> Self {
        match value {
            AuditServiceError::Adapter(err) => Self::Adapter(err),
            AuditServiceError::Checkout(err) => Self::Checkout(err),
            other => Self::Rejected(other.to_string()),
        }
    }
}
