use tracing::debug;

use super::domain::{BusinessDescriptor, ReviewId, ReviewRecord};
use super::pricing::{compute_pricing, Pricing};
use super::scoring::{compute_stats, AuditStats};
use super::selection::{SelectionError, SelectionTracker};
use super::validation::{RejectedReview, ReviewBatch};
use crate::adapters::{AdapterError, ReviewAdapter};
use crate::checkout::{CheckoutDraft, CheckoutGuard};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Failed(String),
}

/// Handle for one review fetch. Only the newest ticket may apply its result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Page-local state of one audit view: the business under audit, the fetched
/// review snapshot and the removal selection. Nothing here outlives the view.
#[derive(Debug, Clone)]
pub struct AuditSession {
    business: BusinessDescriptor,
    state: LoadState,
    reviews: Vec<ReviewRecord>,
    rejected: Vec<RejectedReview>,
    selection: SelectionTracker,
    generation: u64,
}

impl AuditSession {
    pub fn new(business: BusinessDescriptor) -> Self {
        Self {
            business,
            state: LoadState::Idle,
            reviews: Vec::new(),
            rejected: Vec::new(),
            selection: SelectionTracker::new(),
            generation: 0,
        }
    }

    pub fn business(&self) -> &BusinessDescriptor {
        &self.business
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn reviews(&self) -> &[ReviewRecord] {
        &self.reviews
    }

    pub fn rejected(&self) -> &[RejectedReview] {
        &self.rejected
    }

    pub fn selection(&self) -> &SelectionTracker {
        &self.selection
    }

    /// Start a fetch. Returns `None` when the business has no identifier to fetch
    /// with; the view then shows an empty audit.
    pub fn begin_load(&mut self) -> Option<LoadTicket> {
        if self.business.data_id.trim().is_empty() {
            self.state = LoadState::Loaded;
            return None;
        }
        self.generation += 1;
        self.state = LoadState::Loading;
        Some(LoadTicket(self.generation))
    }

    /// Apply a finished fetch. Stale tickets are ignored and `false` is returned.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<ReviewBatch, AdapterError>,
    ) -> bool {
        if ticket.0 != self.generation || self.state != LoadState::Loading {
            debug!(ticket = ticket.0, current = self.generation, "ignoring stale review load");
            return false;
        }
        match result {
            Ok(batch) => {
                self.reviews = batch.records;
                self.rejected = batch.rejected;
                self.selection.clear();
                self.state = LoadState::Loaded;
            }
            Err(err) => {
                self.state = LoadState::Failed(err.user_message());
            }
        }
        true
    }

    /// Fetch and apply in one step.
    pub async fn load<A>(&mut self, adapter: &A) -> Result<(), AdapterError>
    where
        A: ReviewAdapter + ?Sized,
    {
        let Some(ticket) = self.begin_load() else {
            return Ok(());
        };
        let result = adapter.reviews(&self.business).await;
        let failure = result.as_ref().err().cloned();
        self.finish_load(ticket, result);
        failure.map_or(Ok(()), Err)
    }

    /// Navigation away: drop the selection and orphan any in-flight fetch.
    pub fn leave(&mut self) {
        self.generation += 1;
        self.selection.clear();
        if self.state == LoadState::Loading {
            self.state = LoadState::Idle;
        }
    }

    pub fn toggle(&mut self, id: &ReviewId) -> Result<bool, SelectionError> {
        self.selection.toggle_in(&self.reviews, id)
    }

    pub fn stats(&self) -> AuditStats {
        compute_stats(&self.reviews)
    }

    pub fn selected_reviews(&self) -> Vec<ReviewRecord> {
        self.selection.collect(&self.reviews)
    }

    pub fn pricing(&self) -> Pricing {
        compute_pricing(&self.selected_reviews())
    }

    pub fn can_start_cleanup(&self) -> bool {
        self.selection.can_start_cleanup()
    }

    pub fn start_cleanup(&self) -> Result<CheckoutDraft, CheckoutGuard> {
        CheckoutDraft::new(self.business.clone(), self.selected_reviews())
    }
}
