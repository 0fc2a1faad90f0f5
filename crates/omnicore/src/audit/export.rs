use serde::Serialize;
use std::io::Write;

use super::domain::ReviewRecord;
use super::selection::SelectionTracker;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("csv export failed: {0}")]
    Csv(#[from] csv::Error),
    #[error("csv export failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ReviewRow<'a> {
    id: &'a str,
    author: &'a str,
    rating: u8,
    violation: &'a str,
    confidence: Option<u8>,
    date: &'a str,
    selected: bool,
    text: &'a str,
}

/// Write the audit as CSV, one row per review, flagging the current selection.
pub fn write_csv<W: Write>(
    writer: W,
    reviews: &[ReviewRecord],
    selection: &SelectionTracker,
) -> Result<(), ExportError> {
    let mut csv = csv::Writer::from_writer(writer);
    for review in reviews {
        csv.serialize(ReviewRow {
            id: review.id.as_str(),
            author: review.display_author(),
            rating: review.rating.value(),
            violation: review.violation.as_deref().unwrap_or_default(),
            confidence: review.confidence.map(|c| c.value()),
            date: review.date.as_deref().unwrap_or_default(),
            selected: selection.contains(&review.id),
            text: &review.text,
        })?;
    }
    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::domain::{Confidence, Rating, ReviewId};

    #[test]
    fn writes_header_and_selection_flags() {
        let reviews = vec![
            ReviewRecord {
                id: ReviewId::new("r1"),
                author: Some("Jo".to_string()),
                text: "Unfreundlich, nie wieder".to_string(),
                rating: Rating::new(1).expect("valid"),
                violation: Some("Schmähkritik".to_string()),
                confidence: Confidence::new(95),
                date: Some("vor 1 Monat".to_string()),
            },
            ReviewRecord {
                id: ReviewId::new("r2"),
                author: None,
                text: "Super".to_string(),
                rating: Rating::new(5).expect("valid"),
                violation: None,
                confidence: None,
                date: None,
            },
        ];
        let mut selection = SelectionTracker::new();
        selection.toggle(&reviews[0]).expect("actionable");

        let mut buffer = Vec::new();
        write_csv(&mut buffer, &reviews, &selection).expect("export succeeds");
        let output = String::from_utf8(buffer).expect("utf8");
        let lines: Vec<_> = output.lines().collect();

        assert_eq!(lines[0], "id,author,rating,violation,confidence,date,selected,text");
        assert_eq!(
            lines[1],
            "r1,Jo,1,Schmähkritik,95,vor 1 Monat,true,\"Unfreundlich, nie wieder\""
        );
        assert_eq!(lines[2], "r2,Unbekannter Nutzer,5,,,,false,Super");
    }
}
