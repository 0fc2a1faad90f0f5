use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use omnicore::adapters::{AdapterError, CommerceAdapter, ReviewAdapter, SearchAdapter};
use omnicore::audit::{
    BusinessDescriptor, Confidence, Rating, ReviewBatch, ReviewId, ReviewRecord, SearchQuery,
};
use omnicore::checkout::{CheckoutRequest, CheckoutSession};
use omnicore::portal::{AuditEntry, CleanupStatus, DashboardStore, PortalError, Session};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Offline stand-in for the Reviews & Search and Commerce services.
#[derive(Default, Clone)]
pub(crate) struct FixtureCatalog {
    businesses: Arc<Mutex<Vec<(BusinessDescriptor, Vec<ReviewRecord>)>>>,
    checkouts: Arc<Mutex<Vec<CheckoutRequest>>>,
}

impl FixtureCatalog {
    pub(crate) fn demo() -> Self {
        let catalog = Self::default();
        catalog.insert(
            BusinessDescriptor {
                name: "Cafe Sonne".to_string(),
                address: "Hauptstr. 1, 10115 Berlin".to_string(),
                data_id: "0x47a851e0:0x2c1b".to_string(),
            },
            [
                fixture_review("r-1", "Lena K.", 5, "Bester Kaffee im Kiez.", None),
                fixture_review(
                    "r-2",
                    "Anonym",
                    1,
                    "Das ist ein Betrug, die panschen den Kaffee!",
                    Some(("Unbewiesene Tatsachenbehauptung", 96)),
                ),
                fixture_review(
                    "r-3",
                    "Max",
                    2,
                    "Nie wieder. Personal unfreundlich.",
                    Some(("Kein erkennbarer Kundenkontakt", 74)),
                ),
                fixture_review("r-4", "Jonas", 3, "Ganz okay, etwas teuer.", None),
                fixture_review("r-5", "Mia", 4, "Schöne Terrasse.", None),
            ]
            .into_iter()
            .flatten()
            .collect(),
        );
        catalog
    }

    pub(crate) fn insert(&self, business: BusinessDescriptor, reviews: Vec<ReviewRecord>) {
        self.businesses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((business, reviews));
    }

    #[cfg(test)]
    pub(crate) fn checkouts(&self) -> Vec<CheckoutRequest> {
        self.checkouts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

fn fixture_review(
    id: &str,
    author: &str,
    rating: u8,
    text: &str,
    flag: Option<(&str, u8)>,
) -> Option<ReviewRecord> {
    Some(ReviewRecord {
        id: ReviewId::new(id),
        author: Some(author.to_string()),
        text: text.to_string(),
        rating: Rating::new(rating)?,
        violation: flag.map(|(violation, _)| violation.to_string()),
        confidence: flag.and_then(|(_, confidence)| Confidence::new(confidence)),
        date: Some("vor 2 Wochen".to_string()),
    })
}

#[async_trait]
impl SearchAdapter for FixtureCatalog {
    async fn search(&self, query: &SearchQuery) -> Result<BusinessDescriptor, AdapterError> {
        let needle = query.name.trim().to_lowercase();
        self.businesses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(business, _)| business)
            .find(|business| business.name.to_lowercase().contains(&needle))
            .cloned()
            .ok_or_else(|| AdapterError::NotFound(String::new()))
    }
}

#[async_trait]
impl ReviewAdapter for FixtureCatalog {
    async fn reviews(&self, business: &BusinessDescriptor) -> Result<ReviewBatch, AdapterError> {
        let records = self
            .businesses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(known, _)| known.data_id == business.data_id)
            .map(|(_, reviews)| reviews.clone())
            .unwrap_or_default();
        Ok(ReviewBatch::from_records(records))
    }
}

#[async_trait]
impl CommerceAdapter for FixtureCatalog {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AdapterError> {
        let mut checkouts = self.checkouts.lock().unwrap_or_else(PoisonError::into_inner);
        checkouts.push(request.clone());
        Ok(CheckoutSession {
            url: format!("https://checkout.invalid/session/{}", checkouts.len()),
        })
    }
}

/// Portal store answering with a fixed audit history for any signed-in user.
#[derive(Default, Clone)]
pub(crate) struct FixtureDashboard;

#[async_trait]
impl DashboardStore for FixtureDashboard {
    async fn audits_for(&self, _session: &Session) -> Result<Vec<AuditEntry>, PortalError> {
        let entry = |id: &str, company: &str, status: Option<&str>| AuditEntry {
            id: id.to_string(),
            company_name: company.to_string(),
            address: "Berlin".to_string(),
            data_id: Some(format!("0x47a8{id}")),
            cleanup_status: status
                .map(|status| CleanupStatus {
                    current_status: status.to_string(),
                })
                .into_iter()
                .collect(),
        };
        Ok(vec![
            entry("101", "Cafe Sonne", Some("Eingereicht")),
            entry("102", "Autohaus Nord", None),
            entry("103", "Praxis Weber", Some("Gelöscht")),
        ])
    }
}
