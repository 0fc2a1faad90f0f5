//! Boundary validation for upstream payloads.
//!
//! The Reviews & Search service hands back loosely shaped JSON. Every item is
//! checked on its own and either becomes a typed record or a [`ValidationError`];
//! one bad item never sinks the rest of the batch.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::domain::{BusinessDescriptor, Confidence, Rating, ReviewId, ReviewRecord};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("payload item is not a JSON object")]
    NotAnObject,
    #[error("review is missing an id")]
    MissingId,
    #[error("review is missing a rating")]
    MissingRating,
    #[error("rating {0} is not an integer between 1 and 5")]
    InvalidRating(String),
    #[error("flagged review is missing a confidence value")]
    MissingConfidence,
    #[error("confidence {0} is not an integer percentage")]
    InvalidConfidence(String),
    #[error("business is missing a name")]
    MissingName,
    #[error("business is missing a data_id")]
    MissingDataId,
}

/// Review item as the upstream sends it, before any checks.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawReview {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub author: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub rating: Option<Value>,
    #[serde(default)]
    pub violation: Option<Value>,
    #[serde(default)]
    pub confidence: Option<Value>,
    #[serde(default)]
    pub date: Option<Value>,
}

impl TryFrom<RawReview> for ReviewRecord {
    type Error = ValidationError;

    fn try_from(raw: RawReview) -> Result<Self, Self::Error> {
        let id = scalar_string(raw.id.as_ref()).ok_or(ValidationError::MissingId)?;

        let rating = match raw.rating.as_ref() {
            None | Some(Value::Null) => return Err(ValidationError::MissingRating),
            Some(value) => integral(value)
                .and_then(|n| u8::try_from(n).ok())
                .and_then(Rating::new)
                .ok_or_else(|| ValidationError::InvalidRating(value.to_string()))?,
        };

        let violation = text_field(raw.violation.as_ref());
        let confidence = match &violation {
            // Upstream also reports a confidence for clean reviews; it carries no meaning.
            None => None,
            Some(_) => match raw.confidence.as_ref() {
                None | Some(Value::Null) => return Err(ValidationError::MissingConfidence),
                Some(value) => Some(
                    integral(value)
                        .and_then(|n| u8::try_from(n).ok())
                        .and_then(Confidence::new)
                        .ok_or_else(|| ValidationError::InvalidConfidence(value.to_string()))?,
                ),
            },
        };

        Ok(ReviewRecord {
            id: ReviewId(id),
            author: text_field(raw.author.as_ref()),
            text: raw
                .text
                .as_ref()
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            rating,
            violation,
            confidence,
            date: text_field(raw.date.as_ref()),
        })
    }
}

/// Business descriptor as the search endpoint returns it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBusiness {
    #[serde(default)]
    pub name: Option<Value>,
    #[serde(default)]
    pub title: Option<Value>,
    #[serde(default)]
    pub address: Option<Value>,
    #[serde(default)]
    pub data_id: Option<Value>,
    #[serde(default)]
    pub lsig: Option<Value>,
}

impl TryFrom<RawBusiness> for BusinessDescriptor {
    type Error = ValidationError;

    fn try_from(raw: RawBusiness) -> Result<Self, Self::Error> {
        let name = text_field(raw.name.as_ref())
            .or_else(|| text_field(raw.title.as_ref()))
            .ok_or(ValidationError::MissingName)?;
        let data_id = scalar_string(raw.data_id.as_ref())
            .or_else(|| scalar_string(raw.lsig.as_ref()))
            .ok_or(ValidationError::MissingDataId)?;

        Ok(BusinessDescriptor {
            name,
            address: text_field(raw.address.as_ref()).unwrap_or_default(),
            data_id,
        })
    }
}

/// Item that failed validation, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedReview {
    pub index: usize,
    pub error: ValidationError,
}

/// Result of validating a fetched review list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReviewBatch {
    pub records: Vec<ReviewRecord>,
    pub rejected: Vec<RejectedReview>,
}

impl ReviewBatch {
    pub fn from_records(records: Vec<ReviewRecord>) -> Self {
        Self {
            records,
            rejected: Vec::new(),
        }
    }
}

pub fn validate_review(value: Value) -> Result<ReviewRecord, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::NotAnObject);
    }
    let raw: RawReview =
        serde_json::from_value(value).map_err(|_| ValidationError::NotAnObject)?;
    ReviewRecord::try_from(raw)
}

pub fn validate_business(value: Value) -> Result<BusinessDescriptor, ValidationError> {
    if !value.is_object() {
        return Err(ValidationError::NotAnObject);
    }
    let raw: RawBusiness =
        serde_json::from_value(value).map_err(|_| ValidationError::NotAnObject)?;
    BusinessDescriptor::try_from(raw)
}

pub fn validate_batch(items: Vec<Value>) -> ReviewBatch {
    let mut batch = ReviewBatch::default();
    for (index, item) in items.into_iter().enumerate() {
        match validate_review(item) {
            Ok(record) => batch.records.push(record),
            Err(error) => {
                tracing::debug!(index, %error, "dropping malformed review");
                batch.rejected.push(RejectedReview { index, error });
            }
        }
    }
    batch
}

fn integral(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|f| f.fract() == 0.0 && f.is_finite())
                .map(|f| f as i64)
        }),
        _ => None,
    }
}

fn text_field(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
