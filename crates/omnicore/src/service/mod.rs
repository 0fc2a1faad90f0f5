//! Funnel service composing the adapters with the audit and checkout core.

pub mod router;

use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::adapters::{AdapterError, CommerceAdapter, HttpServiceClient, ReviewAdapter, SearchAdapter};
use crate::audit::{
    compute_pricing, AuditReport, BusinessDescriptor, Pricing, ReviewBatch, ReviewId, ReviewRecord,
    SearchQuery, SelectionError, SelectionTracker,
};
use crate::checkout::{
    CheckoutDraft, CheckoutError, CheckoutFlow, CheckoutGuard, CheckoutOutcome, CheckoutReceipt,
    CustomerDetails, PaymentMethod,
};

pub use router::audit_router;

/// Selection priced against the review list it was made from.
#[derive(Debug, Clone, Deserialize)]
pub struct PricingRequest {
    pub reviews: Vec<ReviewRecord>,
    pub selected_ids: Vec<ReviewId>,
}

/// Checkout form submission.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSubmission {
    pub business: BusinessDescriptor,
    pub reviews: Vec<ReviewRecord>,
    pub customer_details: CustomerDetails,
    #[serde(default)]
    pub payment_method: PaymentMethod,
}

#[derive(Debug, thiserror::Error)]
pub enum AuditServiceError {
    #[error("a business name is required")]
    EmptyQuery,
    #[error(transparent)]
    Adapter(#[from] AdapterError),
    #[error(transparent)]
    Selection(#[from] SelectionError),
    #[error(transparent)]
    Guard(#[from] CheckoutGuard),
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Search → reviews → score → select → price → checkout, over injected adapters.
pub struct AuditService {
    search: Arc<dyn SearchAdapter>,
    reviews: Arc<dyn ReviewAdapter>,
    commerce: Arc<dyn CommerceAdapter>,
}

impl AuditService {
    pub fn new(
        search: Arc<dyn SearchAdapter>,
        reviews: Arc<dyn ReviewAdapter>,
        commerce: Arc<dyn CommerceAdapter>,
    ) -> Self {
        Self {
            search,
            reviews,
            commerce,
        }
    }

    /// One client serving every upstream endpoint.
    pub fn with_client(client: Arc<HttpServiceClient>) -> Self {
        Self::new(client.clone(), client.clone(), client)
    }

    pub fn reviews_adapter(&self) -> Arc<dyn ReviewAdapter> {
        self.reviews.clone()
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<BusinessDescriptor, AuditServiceError> {
        if query.is_blank() {
            return Err(AuditServiceError::EmptyQuery);
        }
        Ok(self.search.search(query).await?)
    }

    /// A business without an identifier yields an empty audit without a fetch.
    pub async fn audit(&self, business: BusinessDescriptor) -> Result<AuditReport, AuditServiceError> {
        let batch = if business.data_id.trim().is_empty() {
            debug!(business = %business.name, "no data_id, skipping review fetch");
            ReviewBatch::default()
        } else {
            self.reviews.reviews(&business).await?
        };
        let report = AuditReport::new(business, batch, Utc::now());
        info!(
            business = %report.business.name,
            reviews = report.reviews.len(),
            critical = report.stats.critical,
            score = report.stats.score,
            "audit completed"
        );
        Ok(report)
    }

    pub async fn search_and_audit(&self, query: &SearchQuery) -> Result<AuditReport, AuditServiceError> {
        let business = self.search(query).await?;
        self.audit(business).await
    }

    pub fn price(&self, request: &PricingRequest) -> Result<Pricing, AuditServiceError> {
        let selection = select(&request.reviews, &request.selected_ids)?;
        Ok(compute_pricing(&selection.collect(&request.reviews)))
    }

    pub async fn checkout(
        &self,
        submission: CheckoutSubmission,
    ) -> Result<CheckoutReceipt, AuditServiceError> {
        let CheckoutSubmission {
            business,
            reviews,
            customer_details,
            payment_method,
        } = submission;

        let ids: Vec<ReviewId> = reviews.iter().map(|review| review.id.clone()).collect();
        let selection = select(&reviews, &ids)?;
        let draft = CheckoutDraft::new(business, selection.collect(&reviews))?;

        let mut flow = CheckoutFlow::new();
        match flow
            .submit(self.commerce.as_ref(), &draft, customer_details, payment_method)
            .await
        {
            CheckoutOutcome::Redirect(redirect_url) => Ok(CheckoutReceipt {
                pricing: draft.pricing(),
                redirect_url,
            }),
            CheckoutOutcome::Failed(err) => Err(err.into()),
        }
    }
}

/// Rebuild a selection, refusing ids that are unknown or not actionable.
fn select(reviews: &[ReviewRecord], ids: &[ReviewId]) -> Result<SelectionTracker, SelectionError> {
    let mut selection = SelectionTracker::new();
    for id in ids {
        if !selection.contains(id) {
            selection.toggle_in(reviews, id)?;
        }
    }
    Ok(selection)
}
