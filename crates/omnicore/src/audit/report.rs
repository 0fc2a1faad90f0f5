use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{BusinessDescriptor, ReviewRecord};
use super::scoring::{compute_stats, AuditStats, ThreatLevel};
use super::validation::{RejectedReview, ReviewBatch};

/// A completed audit as served by the API and printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct AuditReport {
    pub business: BusinessDescriptor,
    pub generated_at: DateTime<Utc>,
    pub stats: AuditStats,
    pub threat_level: ThreatLevel,
    pub threat_label: &'static str,
    pub reviews: Vec<ReviewRecord>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejected: Vec<RejectedReview>,
}

impl AuditReport {
    /// Worst ratings come first; ties keep upstream order.
    pub fn new(business: BusinessDescriptor, batch: ReviewBatch, generated_at: DateTime<Utc>) -> Self {
        let ReviewBatch {
            mut records,
            rejected,
        } = batch;
        records.sort_by_key(|review| review.rating);
        let stats = compute_stats(&records);
        let threat_level = stats.threat_level();

        Self {
            business,
            generated_at,
            stats,
            threat_level,
            threat_label: threat_level.label(),
            reviews: records,
            rejected,
        }
    }

    pub fn actionable(&self) -> impl Iterator<Item = &ReviewRecord> {
        self.reviews.iter().filter(|review| review.is_actionable())
    }
}
