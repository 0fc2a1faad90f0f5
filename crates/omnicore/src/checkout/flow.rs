use tracing::{info, warn};

use super::{CheckoutDraft, CheckoutError, CustomerDetails, PaymentMethod};
use crate::adapters::CommerceAdapter;

/// Result of one submission attempt.
#[derive(Debug, Clone)]
pub enum CheckoutOutcome {
    /// Send the browser to the hosted payment page.
    Redirect(String),
    /// Show the error and let the user try again; the selection is untouched.
    Failed(CheckoutError),
}

/// Submission state of the checkout form: a busy flag and an error slot.
///
/// Idle -> Submitting -> (Redirected | Failed). A failed attempt lands back in
/// idle with the error recorded. Dropping an in-flight `submit` future leaves the
/// flag set; no timeout clears it.
#[derive(Debug, Default)]
pub struct CheckoutFlow {
    busy: bool,
    error: Option<CheckoutError>,
}

impl CheckoutFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Enabled state of the submit control.
    pub fn can_submit(&self) -> bool {
        !self.busy
    }

    pub fn error(&self) -> Option<&CheckoutError> {
        self.error.as_ref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub async fn submit<C>(
        &mut self,
        commerce: &C,
        draft: &CheckoutDraft,
        details: CustomerDetails,
        payment_method: PaymentMethod,
    ) -> CheckoutOutcome
    where
        C: CommerceAdapter + ?Sized,
    {
        if self.busy {
            return CheckoutOutcome::Failed(CheckoutError::Busy);
        }
        if let Err(err) = details.validate() {
            self.error = Some(err.clone());
            return CheckoutOutcome::Failed(err);
        }

        self.busy = true;
        self.error = None;
        let request = draft.request(details, payment_method);
        let result = commerce.create_session(&request).await;
        self.busy = false;

        match result {
            Ok(session) => {
                info!(
                    company = %draft.business().name,
                    items = draft.selected().len(),
                    total = %draft.pricing().total,
                    "checkout session created"
                );
                CheckoutOutcome::Redirect(session.url)
            }
            Err(err) => {
                warn!(error = %err, kind = ?err.failure_kind(), "checkout session failed");
                let err = CheckoutError::from(err);
                self.error = Some(err.clone());
                CheckoutOutcome::Failed(err)
            }
        }
    }
}
