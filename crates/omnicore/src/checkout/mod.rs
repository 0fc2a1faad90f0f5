//! Checkout: from a non-empty selection to a hosted payment redirect.

mod flow;

pub use flow::{CheckoutFlow, CheckoutOutcome};

use serde::{Deserialize, Serialize};

use crate::adapters::{AdapterError, FailureKind, PAYMENT_UNAVAILABLE_MESSAGE};
use crate::audit::{compute_pricing, BusinessDescriptor, Pricing, ReviewRecord};
use crate::portal::AppRoute;

/// Billing contact entered on the checkout form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip: String,
    #[serde(default)]
    pub city: String,
}

impl CustomerDetails {
    pub fn validate(&self) -> Result<(), CheckoutError> {
        let fields = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("address", &self.address),
            ("zip", &self.zip),
            ("city", &self.city),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(CheckoutError::MissingField(*name));
        }
        if !self.email.contains('@') {
            return Err(CheckoutError::InvalidEmail);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[default]
    Card,
    Paypal,
    Mobile,
}

/// The only way into checkout: a business plus a non-empty selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutDraft {
    business: BusinessDescriptor,
    selected: Vec<ReviewRecord>,
    pricing: Pricing,
}

/// Reason checkout cannot be entered; the caller redirects instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CheckoutGuard {
    #[error("no reviews selected for removal")]
    EmptySelection,
}

impl CheckoutGuard {
    pub fn redirect(self) -> AppRoute {
        match self {
            CheckoutGuard::EmptySelection => AppRoute::Search,
        }
    }
}

impl CheckoutDraft {
    pub fn new(
        business: BusinessDescriptor,
        selected: Vec<ReviewRecord>,
    ) -> Result<Self, CheckoutGuard> {
        if selected.is_empty() {
            return Err(CheckoutGuard::EmptySelection);
        }
        let pricing = compute_pricing(&selected);
        Ok(Self {
            business,
            selected,
            pricing,
        })
    }

    pub fn business(&self) -> &BusinessDescriptor {
        &self.business
    }

    pub fn selected(&self) -> &[ReviewRecord] {
        &self.selected
    }

    pub fn pricing(&self) -> Pricing {
        self.pricing
    }

    /// Route for the "cancel" action: back to the audit of the same business.
    pub fn cancel_route(&self) -> AppRoute {
        AppRoute::Audit
    }

    pub fn request(
        &self,
        customer_details: CustomerDetails,
        payment_method: PaymentMethod,
    ) -> CheckoutRequest {
        CheckoutRequest {
            reviews: self.selected.clone(),
            company: self.business.clone(),
            customer_details,
            payment_method,
        }
    }
}

/// Body sent to the commerce service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub reviews: Vec<ReviewRecord>,
    pub company: BusinessDescriptor,
    pub customer_details: CustomerDetails,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

/// Hosted payment page returned by the commerce service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub url: String,
}

/// What the API hands back after a successful checkout request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckoutReceipt {
    pub pricing: Pricing,
    pub redirect_url: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CheckoutError {
    #[error("required field '{0}' is empty")]
    MissingField(&'static str),
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("a checkout request is already in flight")]
    Busy,
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl CheckoutError {
    pub fn user_message(&self) -> String {
        match self {
            CheckoutError::MissingField(_) | CheckoutError::InvalidEmail => {
                "Bitte füllen Sie alle Pflichtfelder korrekt aus.".to_string()
            }
            CheckoutError::Busy => "Ihre Anfrage wird bereits verarbeitet.".to_string(),
            CheckoutError::Adapter(err) => match err.failure_kind() {
                FailureKind::Transport => PAYMENT_UNAVAILABLE_MESSAGE.to_string(),
                FailureKind::NotFound | FailureKind::BusinessLogic => err.user_message(),
            },
        }
    }

    /// Whether the fault sits with the submitted form rather than a collaborator.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CheckoutError::MissingField(_) | CheckoutError::InvalidEmail | CheckoutError::Busy
        )
    }
}
