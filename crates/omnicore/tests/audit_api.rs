use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use omnicore::adapters::{AdapterError, CommerceAdapter, ReviewAdapter, SearchAdapter};
use omnicore::audit::{
    BusinessDescriptor, Confidence, Rating, ReviewBatch, ReviewId, ReviewRecord, SearchQuery,
};
use omnicore::checkout::{CheckoutRequest, CheckoutSession};
use omnicore::service::{audit_router, AuditService};
use serde_json::{json, Value};
use tower::ServiceExt;

struct FakeUpstream {
    business: BusinessDescriptor,
    reviews: Vec<ReviewRecord>,
    checkout: Mutex<Option<Result<CheckoutSession, AdapterError>>>,
    requests: Mutex<Vec<CheckoutRequest>>,
    review_calls: AtomicUsize,
}

impl FakeUpstream {
    fn new(checkout: Result<CheckoutSession, AdapterError>) -> Self {
        Self {
            business: business(),
            reviews: vec![
                review("r1", 5, None),
                review("r2", 1, Some(90)),
                review("r3", 4, None),
                review("r4", 2, Some(80)),
                review("r5", 3, None),
            ],
            checkout: Mutex::new(Some(checkout)),
            requests: Mutex::new(Vec::new()),
            review_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl SearchAdapter for FakeUpstream {
    async fn search(&self, query: &SearchQuery) -> Result<BusinessDescriptor, AdapterError> {
        if query.name == self.business.name {
            Ok(self.business.clone())
        } else {
            Err(AdapterError::NotFound("Kein Unternehmen gefunden".to_string()))
        }
    }
}

#[async_trait]
impl ReviewAdapter for FakeUpstream {
    async fn reviews(&self, business: &BusinessDescriptor) -> Result<ReviewBatch, AdapterError> {
        self.review_calls.fetch_add(1, Ordering::SeqCst);
        if business.data_id == self.business.data_id {
            Ok(ReviewBatch::from_records(self.reviews.clone()))
        } else {
            Err(AdapterError::Status(500))
        }
    }
}

#[async_trait]
impl CommerceAdapter for FakeUpstream {
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AdapterError> {
        self.requests.lock().expect("requests mutex").push(request.clone());
        self.checkout
            .lock()
            .expect("checkout mutex")
            .take()
            .expect("one checkout scripted")
    }
}

fn business() -> BusinessDescriptor {
    BusinessDescriptor {
        name: "Cafe Sonne".to_string(),
        address: "Hauptstr. 1".to_string(),
        data_id: "0xabc".to_string(),
    }
}

fn review(id: &str, rating: u8, confidence: Option<u8>) -> ReviewRecord {
    ReviewRecord {
        id: ReviewId::new(id),
        author: None,
        text: format!("text of {id}"),
        rating: Rating::new(rating).expect("valid rating"),
        violation: confidence.map(|_| "Beleidigung".to_string()),
        confidence: confidence.map(|value| Confidence::new(value).expect("valid confidence")),
        date: None,
    }
}

fn customer() -> Value {
    json!({
        "firstName": "Erika",
        "lastName": "Muster",
        "email": "erika@example.test",
        "address": "Hauptstr. 1",
        "zip": "10115",
        "city": "Berlin"
    })
}

fn app(upstream: Arc<FakeUpstream>) -> Router {
    let service = AuditService::new(upstream.clone(), upstream.clone(), upstream);
    audit_router(Arc::new(service))
}

fn scripted_ok() -> Arc<FakeUpstream> {
    Arc::new(FakeUpstream::new(Ok(CheckoutSession {
        url: "https://pay.example/s/1".to_string(),
    })))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn search_resolves_business() {
    let (status, body) = send(app(scripted_ok()), get("/api/v1/search?name=Cafe%20Sonne")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data_id"], "0xabc");
}

#[tokio::test]
async fn search_surfaces_not_found_with_upstream_text() {
    let (status, body) = send(app(scripted_ok()), get("/api/v1/search?name=Mond")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Kein Unternehmen gefunden");
    assert_eq!(body["kind"], "not_found");
}

#[tokio::test]
async fn blank_search_is_rejected_before_the_adapter() {
    let (status, _) = send(app(scripted_ok()), get("/api/v1/search?name=%20%20")).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn audit_scores_and_sorts_worst_first() {
    let (status, body) = send(
        app(scripted_ok()),
        get("/api/v1/audit?data_id=0xabc&name=Cafe%20Sonne"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["stats"]["critical"], 3);
    assert_eq!(body["stats"]["score"], 64);
    // (90 + 80 + 0) / 3 rounds to 57
    assert_eq!(body["stats"]["confidence"], 57);
    assert_eq!(body["threat_level"], "stable");
    let ratings: Vec<u64> = body["reviews"]
        .as_array()
        .expect("review array")
        .iter()
        .map(|review| review["rating"].as_u64().expect("rating"))
        .collect();
    assert_eq!(ratings, vec![1, 2, 3, 4, 5]);
    assert!(body.get("rejected").is_none());
}

#[tokio::test]
async fn audit_without_data_id_is_empty_and_skips_the_fetch() {
    let upstream = scripted_ok();
    let (status, body) = send(
        app(upstream.clone()),
        get("/api/v1/audit?data_id=&name=Cafe%20Sonne"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(upstream.review_calls.load(Ordering::SeqCst), 0);
    assert_eq!(body["business"]["name"], "Cafe Sonne");
    assert_eq!(body["stats"]["score"], 100);
    assert_eq!(body["stats"]["critical"], 0);
    assert_eq!(body["stats"]["confidence"], 0);
    assert_eq!(body["reviews"], json!([]));
}

#[tokio::test]
async fn audit_failure_maps_to_bad_gateway() {
    let (status, body) = send(app(scripted_ok()), get("/api/v1/audit?data_id=other")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["kind"], "transport");
}

#[tokio::test]
async fn pricing_counts_selected_actionable_reviews() {
    let upstream = scripted_ok();
    let reviews = serde_json::to_value(&upstream.reviews).expect("reviews serialize");

    let (status, body) = send(
        app(upstream.clone()),
        post(
            "/api/v1/pricing",
            json!({ "reviews": reviews, "selected_ids": ["r4", "r2", "r4"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    assert_eq!(body["unit_price"], "19.90");
    assert_eq!(body["total"], "39.80");

    let (status, _) = send(
        app(upstream),
        post(
            "/api/v1/pricing",
            json!({ "reviews": reviews, "selected_ids": ["r1"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn checkout_returns_redirect_and_forwards_selection() {
    let upstream = scripted_ok();
    let selected = vec![review("r2", 1, Some(90)), review("r4", 2, Some(80))];

    let (status, body) = send(
        app(upstream.clone()),
        post(
            "/api/v1/checkout",
            json!({
                "business": business(),
                "reviews": selected,
                "customer_details": customer(),
                "payment_method": "paypal"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["redirect_url"], "https://pay.example/s/1");
    assert_eq!(body["pricing"]["total"], "39.80");
    let sent = upstream.requests.lock().expect("requests mutex");
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].company.data_id, "0xabc");
    assert_eq!(sent[0].reviews.len(), 2);
}

#[tokio::test]
async fn checkout_without_selection_redirects_to_search() {
    let upstream = scripted_ok();
    let (status, body) = send(
        app(upstream.clone()),
        post(
            "/api/v1/checkout",
            json!({
                "business": business(),
                "reviews": [],
                "customer_details": customer()
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["redirect"], "/");
    assert!(upstream.requests.lock().expect("requests mutex").is_empty());
}

#[tokio::test]
async fn checkout_validates_customer_details() {
    let upstream = scripted_ok();
    let mut details = customer();
    details["email"] = json!("no-at-sign");

    let (status, body) = send(
        app(upstream.clone()),
        post(
            "/api/v1/checkout",
            json!({
                "business": business(),
                "reviews": [review("r2", 1, Some(90))],
                "customer_details": details
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Bitte füllen Sie alle Pflichtfelder korrekt aus.");
    assert!(upstream.requests.lock().expect("requests mutex").is_empty());
}

#[tokio::test]
async fn checkout_transport_failure_reads_as_payment_unavailable() {
    let upstream = Arc::new(FakeUpstream::new(Err(AdapterError::Transport(
        "connection reset".to_string(),
    ))));

    let (status, body) = send(
        app(upstream),
        post(
            "/api/v1/checkout",
            json!({
                "business": business(),
                "reviews": [review("r2", 1, Some(90))],
                "customer_details": customer()
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "Zahlung aktuell nicht möglich. Bitte versuchen Sie es später erneut."
    );
}
