use std::collections::BTreeSet;

use super::domain::{ReviewId, ReviewRecord};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectionError {
    #[error("review {0} is not eligible for removal (rating above 3)")]
    NotActionable(ReviewId),
    #[error("review {0} is not part of the loaded audit")]
    UnknownReview(ReviewId),
}

/// Reviews the user marked for removal during one audit session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionTracker {
    selected: BTreeSet<ReviewId>,
}

impl SelectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_actionable(review: &ReviewRecord) -> bool {
        review.is_actionable()
    }

    /// Flip membership of `review`. Non-actionable reviews are refused and the
    /// selection is left as it was. Returns whether the review is now selected.
    pub fn toggle(&mut self, review: &ReviewRecord) -> Result<bool, SelectionError> {
        if !Self::is_actionable(review) {
            return Err(SelectionError::NotActionable(review.id.clone()));
        }
        Ok(self.toggle_id(review.id.clone()))
    }

    /// Flip membership of a raw id without the actionability check.
    pub fn toggle_id(&mut self, id: ReviewId) -> bool {
        if self.selected.remove(&id) {
            false
        } else {
            self.selected.insert(id);
            true
        }
    }

    /// Look `id` up in `reviews` and toggle it through the actionability check.
    pub fn toggle_in(
        &mut self,
        reviews: &[ReviewRecord],
        id: &ReviewId,
    ) -> Result<bool, SelectionError> {
        let review = reviews
            .iter()
            .find(|review| &review.id == id)
            .ok_or_else(|| SelectionError::UnknownReview(id.clone()))?;
        self.toggle(review)
    }

    pub fn contains(&self, id: &ReviewId) -> bool {
        self.selected.contains(id)
    }

    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Enabled state of the "start cleanup" control.
    pub fn can_start_cleanup(&self) -> bool {
        !self.selected.is_empty()
    }

    pub fn clear(&mut self) {
        self.selected.clear();
    }

    /// Selected reviews in the order they appear in `reviews`.
    pub fn collect(&self, reviews: &[ReviewRecord]) -> Vec<ReviewRecord> {
        reviews
            .iter()
            .filter(|review| self.selected.contains(&review.id))
            .cloned()
            .collect()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ReviewId> {
        self.selected.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::domain::{Confidence, Rating};

    fn review(id: &str, rating: u8) -> ReviewRecord {
        ReviewRecord {
            id: ReviewId::new(id),
            author: Some("Tester".to_string()),
            text: "text".to_string(),
            rating: Rating::new(rating).expect("valid rating"),
            violation: (rating <= 3).then(|| "flagged".to_string()),
            confidence: (rating <= 3).then(|| Confidence::new(80).expect("valid")),
            date: None,
        }
    }

    #[test]
    fn double_toggle_restores_previous_state() {
        let mut tracker = SelectionTracker::new();
        tracker.toggle(&review("keep", 1)).expect("actionable");
        let before = tracker.clone();

        let target = review("flip", 2);
        assert!(tracker.toggle(&target).expect("actionable"));
        assert!(!tracker.toggle(&target).expect("actionable"));
        assert_eq!(tracker, before);
    }

    #[test]
    fn refuses_non_actionable_reviews() {
        let mut tracker = SelectionTracker::new();
        let err = tracker.toggle(&review("happy", 4)).expect_err("4 stars");
        assert_eq!(err, SelectionError::NotActionable(ReviewId::new("happy")));
        assert!(tracker.is_empty());
    }

    #[test]
    fn collect_preserves_list_order() {
        let reviews = vec![review("a", 1), review("b", 5), review("c", 2), review("d", 3)];
        let mut tracker = SelectionTracker::new();
        for id in ["d", "a", "c"] {
            tracker
                .toggle_in(&reviews, &ReviewId::new(id))
                .expect("known actionable review");
        }
        tracker.toggle_id(ReviewId::new("not-loaded"));

        let ids: Vec<_> = tracker
            .collect(&reviews)
            .into_iter()
            .map(|review| review.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "c", "d"]);
    }

    #[test]
    fn cleanup_control_tracks_selection_size() {
        let reviews = vec![review("a", 1)];
        let mut tracker = SelectionTracker::new();
        assert!(!tracker.can_start_cleanup());
        tracker
            .toggle_in(&reviews, &ReviewId::new("a"))
            .expect("actionable");
        assert_eq!(tracker.can_start_cleanup(), tracker.len() > 0);
        tracker.clear();
        assert!(!tracker.can_start_cleanup());
    }

    #[test]
    fn unknown_ids_are_reported() {
        let mut tracker = SelectionTracker::new();
        let err = tracker
            .toggle_in(&[], &ReviewId::new("ghost"))
            .expect_err("empty list");
        assert!(matches!(err, SelectionError::UnknownReview(_)));
    }
}
