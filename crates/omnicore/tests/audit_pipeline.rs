use omnicore::audit::{
    compute_pricing, compute_stats, validate_batch, AuditSession, BusinessDescriptor, ReviewId,
    SelectionTracker, ThreatLevel,
};
use serde_json::{json, Value};

fn upstream_reviews(ratings: &[u8]) -> Vec<Value> {
    ratings
        .iter()
        .enumerate()
        .map(|(index, rating)| {
            if *rating <= 3 {
                json!({
                    "id": format!("r{index}"),
                    "text": "Schlecht",
                    "rating": rating,
                    "violation": "Beleidigung",
                    "confidence": 60 + index as u64
                })
            } else {
                json!({ "id": format!("r{index}"), "text": "Gut", "rating": rating })
            }
        })
        .collect()
}

#[test]
fn score_stays_within_bounds_and_never_rises_with_more_critical_reviews() {
    let mut previous = 100;
    for critical in 0..12 {
        let mut ratings = vec![5u8; 4];
        ratings.extend(std::iter::repeat(1u8).take(critical));
        let batch = validate_batch(upstream_reviews(&ratings));
        let stats = compute_stats(&batch.records);

        assert!((5..=100).contains(&stats.score), "score {}", stats.score);
        assert!(stats.score <= previous);
        assert_eq!(stats.critical, critical);
        assert!(stats.confidence <= 100);
        previous = stats.score;
    }
    assert_eq!(previous, 5);
}

#[test]
fn threat_flips_to_critical_below_half_score() {
    let five_critical = validate_batch(upstream_reviews(&[1, 2, 3, 1, 2]));
    let stats = compute_stats(&five_critical.records);
    assert_eq!(stats.score, 40);
    assert_eq!(stats.threat_level(), ThreatLevel::Critical);

    let four_critical = validate_batch(upstream_reviews(&[1, 2, 3, 1]));
    assert_eq!(
        compute_stats(&four_critical.records).threat_level(),
        ThreatLevel::Stable
    );
}

#[test]
fn selection_order_follows_the_review_list() {
    let batch = validate_batch(upstream_reviews(&[1, 5, 2, 3, 4]));
    let mut selection = SelectionTracker::new();
    for id in ["r3", "r0", "r2"] {
        selection
            .toggle_in(&batch.records, &ReviewId::new(id))
            .expect("actionable");
    }
    assert!(selection.toggle_in(&batch.records, &ReviewId::new("r1")).is_err());
    assert!(selection.toggle_in(&batch.records, &ReviewId::new("missing")).is_err());

    let selected = selection.collect(&batch.records);
    let ids: Vec<_> = selected.iter().map(|review| review.id.as_str()).collect();
    assert_eq!(ids, vec!["r0", "r2", "r3"]);
    assert_eq!(compute_pricing(&selected).total_display(), "59.70");
}

#[test]
fn session_applies_validated_batch_and_prices_selection() {
    let mut session = AuditSession::new(BusinessDescriptor {
        name: "Cafe Sonne".to_string(),
        address: String::new(),
        data_id: "0xabc".to_string(),
    });
    let ticket = session.begin_load().expect("fetchable");
    let mut items = upstream_reviews(&[2, 5]);
    items.push(json!({ "id": "broken" }));
    assert!(session.finish_load(ticket, Ok(validate_batch(items))));

    assert_eq!(session.reviews().len(), 2);
    assert_eq!(session.rejected().len(), 1);
    assert!(!session.can_start_cleanup());

    session.toggle(&ReviewId::new("r0")).expect("actionable");
    assert_eq!(session.pricing().total_display(), "19.90");
    assert!(session.toggle(&ReviewId::new("r0")).is_ok());
    assert_eq!(session.pricing().total_display(), "0.00");
}
