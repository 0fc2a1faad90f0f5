//! Boundaries to the external Reviews & Search and Commerce services.

pub mod http;

use async_trait::async_trait;
use serde::Serialize;

use crate::audit::{BusinessDescriptor, ReviewBatch, SearchQuery, ValidationError};
use crate::checkout::{CheckoutRequest, CheckoutSession};

pub use http::HttpServiceClient;

/// Resolves free text into a canonical business.
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    async fn search(&self, query: &SearchQuery) -> Result<BusinessDescriptor, AdapterError>;
}

/// Fetches the classified review set of a business.
#[async_trait]
pub trait ReviewAdapter: Send + Sync {
    async fn reviews(&self, business: &BusinessDescriptor) -> Result<ReviewBatch, AdapterError>;
}

/// Starts a hosted payment flow for the selected reviews.
#[async_trait]
pub trait CommerceAdapter: Send + Sync {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AdapterError>;
}

/// How a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotFound,
    Transport,
    BusinessLogic,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AdapterError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("upstream returned status {0}")]
    Status(u16),
    #[error("upstream unreachable: {0}")]
    Transport(String),
    #[error("upstream payload rejected: {0}")]
    Payload(#[from] ValidationError),
    #[error("upstream response did not match the expected shape: {0}")]
    Malformed(String),
    #[error("checkout session response carried no redirect url")]
    MissingRedirect,
}

impl AdapterError {
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            AdapterError::NotFound(_) => FailureKind::NotFound,
            AdapterError::Status(_)
            | AdapterError::Transport(_)
            | AdapterError::Malformed(_)
            | AdapterError::Payload(_) => FailureKind::Transport,
            AdapterError::MissingRedirect => FailureKind::BusinessLogic,
        }
    }

    /// Text for the blocking notification shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            AdapterError::NotFound(message) if !message.trim().is_empty() => message.clone(),
            AdapterError::NotFound(_) => NOT_FOUND_MESSAGE.to_string(),
            AdapterError::MissingRedirect => MISSING_REDIRECT_MESSAGE.to_string(),
            _ => TRANSPORT_MESSAGE.to_string(),
        }
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(value: reqwest::Error) -> Self {
        match value.status() {
            Some(status) => AdapterError::Status(status.as_u16()),
            None if value.is_decode() => AdapterError::Malformed(value.to_string()),
            None => AdapterError::Transport(value.to_string()),
        }
    }
}

pub const NOT_FOUND_MESSAGE: &str = "Unternehmen nicht gefunden";
pub const TRANSPORT_MESSAGE: &str =
    "Verbindung fehlgeschlagen. Bitte versuchen Sie es später erneut.";
pub const PAYMENT_UNAVAILABLE_MESSAGE: &str =
    "Zahlung aktuell nicht möglich. Bitte versuchen Sie es später erneut.";
pub const MISSING_REDIRECT_MESSAGE: &str = "Fehler beim Erstellen der Zahlungssitzung.";
