use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use super::{AdapterError, CommerceAdapter, ReviewAdapter, SearchAdapter};
use crate::audit::{validate_batch, validate_business, BusinessDescriptor, ReviewBatch, SearchQuery};
use crate::checkout::{CheckoutRequest, CheckoutSession};
use crate::config::{Endpoint, UpstreamConfig};

/// reqwest client for the Reviews & Search and Commerce services.
///
/// No retries: every failure goes straight back to the caller.
#[derive(Debug, Clone)]
pub struct HttpServiceClient {
    client: reqwest::Client,
    upstream: UpstreamConfig,
}

impl HttpServiceClient {
    pub fn new(upstream: UpstreamConfig) -> Result<Self, AdapterError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = upstream.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| AdapterError::Transport(format!("http client setup failed: {err}")))?;
        Ok(Self { client, upstream })
    }

    pub fn upstream(&self) -> &UpstreamConfig {
        &self.upstream
    }

    fn url(&self, endpoint: Endpoint) -> String {
        self.upstream.endpoint_url(endpoint)
    }

    async fn read_json(response: reqwest::Response) -> Result<Value, AdapterError> {
        let response = response.error_for_status()?;
        Ok(response.json::<Value>().await?)
    }
}

#[async_trait]
impl SearchAdapter for HttpServiceClient {
    #[instrument(name = "search_business", skip(self), fields(name = %query.name))]
    async fn search(&self, query: &SearchQuery) -> Result<BusinessDescriptor, AdapterError> {
        let url = self.url(Endpoint::Search);
        debug!(%url, "resolving business");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("name", query.name.as_str()),
                ("address", query.address.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "search request failed");
                AdapterError::from(err)
            })?;
        let body = Self::read_json(response).await?;

        if let Some(message) = body.get("error") {
            let message = message.as_str().unwrap_or_default().to_string();
            return Err(AdapterError::NotFound(message));
        }

        Ok(validate_business(body)?)
    }
}

#[async_trait]
impl ReviewAdapter for HttpServiceClient {
    #[instrument(name = "fetch_reviews", skip(self, business), fields(data_id = %business.data_id))]
    async fn reviews(&self, business: &BusinessDescriptor) -> Result<ReviewBatch, AdapterError> {
        let url = self.url(Endpoint::Reviews);
        debug!(%url, "fetching reviews");
        let response = self
            .client
            .get(&url)
            .query(&[
                ("data_id", business.data_id.as_str()),
                ("name", business.name.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "review request failed");
                AdapterError::from(err)
            })?;

        match Self::read_json(response).await? {
            Value::Array(items) => {
                let batch = validate_batch(items);
                if !batch.rejected.is_empty() {
                    warn!(
                        rejected = batch.rejected.len(),
                        accepted = batch.records.len(),
                        "upstream sent malformed reviews"
                    );
                }
                Ok(batch)
            }
            other => Err(AdapterError::Malformed(format!(
                "expected a review array, got {}",
                json_kind(&other)
            ))),
        }
    }
}

#[async_trait]
impl CommerceAdapter for HttpServiceClient {
    #[instrument(name = "create_checkout_session", skip_all, fields(items = request.reviews.len()))]
    async fn create_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, AdapterError> {
        let url = self.url(Endpoint::CheckoutSession);
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "checkout session request failed");
                AdapterError::from(err)
            })?;
        let body = Self::read_json(response).await?;

        body.get("url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| CheckoutSession {
                url: url.to_string(),
            })
            .ok_or(AdapterError::MissingRedirect)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
