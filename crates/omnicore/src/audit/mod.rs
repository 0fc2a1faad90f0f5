//! Audit pipeline: validated reviews in, score, selection and price out.

pub mod domain;
pub mod export;
pub mod pricing;
pub mod report;
pub mod scoring;
pub mod selection;
pub mod session;
pub mod validation;

pub use domain::{BusinessDescriptor, Confidence, Rating, ReviewId, ReviewRecord, SearchQuery};
pub use export::{write_csv, ExportError};
pub use pricing::{compute_pricing, Money, Pricing, UNIT_PRICE};
pub use report::AuditReport;
pub use scoring::{compute_stats, AuditStats, ThreatLevel};
pub use selection::{SelectionError, SelectionTracker};
pub use session::{AuditSession, LoadState, LoadTicket};
pub use validation::{
    validate_batch, validate_business, validate_review, RawBusiness, RawReview, RejectedReview,
    ReviewBatch, ValidationError,
};
