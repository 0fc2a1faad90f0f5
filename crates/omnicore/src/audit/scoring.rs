use serde::Serialize;

use super::domain::ReviewRecord;

/// Score before any penalty.
pub const MAX_SCORE: u32 = 100;
/// The score never drops below this floor.
pub const SCORE_FLOOR: u32 = 5;
/// Points deducted per actionable review.
pub const PENALTY_PER_CRITICAL: u32 = 12;
/// Reported confidence when reviews exist but none are actionable.
pub const DEFAULT_CONFIDENCE: u32 = 94;
/// Scores below this are shown as a critical threat.
pub const CRITICAL_THRESHOLD: u32 = 50;

/// Headline numbers for an audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuditStats {
    pub score: u32,
    pub critical: usize,
    pub confidence: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatLevel {
    Critical,
    Stable,
}

impl ThreatLevel {
    pub fn label(self) -> &'static str {
        match self {
            ThreatLevel::Critical => "Kritische Bedrohung erkannt.",
            ThreatLevel::Stable => "Reputation stabil.",
        }
    }
}

impl AuditStats {
    pub fn threat_level(&self) -> ThreatLevel {
        if self.score < CRITICAL_THRESHOLD {
            ThreatLevel::Critical
        } else {
            ThreatLevel::Stable
        }
    }

    /// Width of the threat bar, `100 - score`.
    pub fn threat_percent(&self) -> u32 {
        MAX_SCORE.saturating_sub(self.score)
    }
}

pub fn compute_stats(reviews: &[ReviewRecord]) -> AuditStats {
    if reviews.is_empty() {
        return AuditStats {
            score: MAX_SCORE,
            critical: 0,
            confidence: 0,
        };
    }

    let (critical, confidence_sum) = reviews
        .iter()
        .filter(|review| review.is_actionable())
        .fold((0usize, 0u64), |(count, sum), review| {
            let confidence = review.confidence.map_or(0, |c| u64::from(c.value()));
            (count + 1, sum + confidence)
        });

    let confidence = if critical == 0 {
        DEFAULT_CONFIDENCE
    } else {
        rounded_mean(confidence_sum, critical as u64)
    };

    let penalty = u32::try_from(critical)
        .unwrap_or(u32::MAX)
        .saturating_mul(PENALTY_PER_CRITICAL);
    let score = MAX_SCORE.saturating_sub(penalty).max(SCORE_FLOOR);

    AuditStats {
        score,
        critical,
        confidence,
    }
}

/// Half-up rounding of `sum / count` without leaving integer arithmetic.
fn rounded_mean(sum: u64, count: u64) -> u32 {
    let mean = (2 * sum + count) / (2 * count);
    u32::try_from(mean).unwrap_or(u32::MAX)
}
