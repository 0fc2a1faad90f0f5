use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{AuditService, AuditServiceError, CheckoutSubmission, PricingRequest};
use crate::audit::{BusinessDescriptor, SearchQuery};
use crate::error::AppError;

/// HTTP endpoints for the audit funnel.
pub fn audit_router(service: Arc<AuditService>) -> Router {
    Router::new()
        .route("/api/v1/search", get(search_handler))
        .route("/api/v1/audit", get(audit_handler))
        .route("/api/v1/pricing", post(pricing_handler))
        .route("/api/v1/checkout", post(checkout_handler))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuditParams {
    data_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    address: String,
}

pub(crate) async fn search_handler(
    State(service): State<Arc<AuditService>>,
    Query(query): Query<SearchQuery>,
) -> Response {
    match service.search(&query).await {
        Ok(business) => (StatusCode::OK, Json(business)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn audit_handler(
    State(service): State<Arc<AuditService>>,
    Query(params): Query<AuditParams>,
) -> Response {
    let business = BusinessDescriptor {
        name: params.name,
        address: params.address,
        data_id: params.data_id,
    };
    match service.audit(business).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn pricing_handler(
    State(service): State<Arc<AuditService>>,
    Json(request): Json<PricingRequest>,
) -> Response {
    match service.price(&request) {
        Ok(pricing) => (StatusCode::OK, Json(pricing)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn checkout_handler(
    State(service): State<Arc<AuditService>>,
    Json(submission): Json<CheckoutSubmission>,
) -> Response {
    match service.checkout(submission).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: AuditServiceError) -> Response {
    match err {
        AuditServiceError::Guard(guard) => {
            let payload = json!({
                "error": guard.to_string(),
                "redirect": guard.redirect().path(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        other => AppError::from(other).into_response(),
    }
}
