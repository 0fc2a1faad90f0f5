use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::time::Duration;
use tracing::{instrument, warn};

use super::dashboard::{AuditEntry, DashboardStore, PortalError};
use super::session::Session;
use crate::config::PortalConfig;

/// REST reader for the managed database behind the customer portal.
#[derive(Debug, Clone)]
pub struct PortalClient {
    client: reqwest::Client,
    base_url: String,
    anon_key: Option<String>,
}

impl PortalClient {
    pub fn from_config(
        config: &PortalConfig,
        timeout: Option<Duration>,
    ) -> Result<Self, PortalError> {
        let base_url = config
            .url
            .as_deref()
            .ok_or(PortalError::NotConfigured)?
            .trim_end_matches('/')
            .to_string();
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| PortalError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url,
            anon_key: config.anon_key.clone(),
        })
    }

    fn headers(&self, session: &Session) -> Result<HeaderMap, PortalError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = &self.anon_key {
            let value = HeaderValue::from_str(key)
                .map_err(|err| PortalError::Malformed(format!("invalid api key header: {err}")))?;
            headers.insert("apikey", value);
        }
        let bearer = HeaderValue::from_str(&format!("Bearer {}", session.access_token))
            .map_err(|err| PortalError::Malformed(format!("invalid auth header: {err}")))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

#[async_trait]
impl DashboardStore for PortalClient {
    #[instrument(name = "portal_audits", skip_all, fields(user = %session.user_id))]
    async fn audits_for(&self, session: &Session) -> Result<Vec<AuditEntry>, PortalError> {
        let url = format!("{}/rest/v1/audits", self.base_url);
        let user_filter = format!("eq.{}", session.user_id);
        let response = self
            .client
            .get(&url)
            .headers(self.headers(session)?)
            .query(&[
                ("select", "*,cleanup_status(*)"),
                ("user_id", user_filter.as_str()),
            ])
            .send()
            .await
            .map_err(|err| {
                warn!(error = %err, "portal request failed");
                PortalError::Transport(err.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(PortalError::Unauthenticated);
        }
        if !status.is_success() {
            return Err(PortalError::Status(status.as_u16()));
        }

        response
            .json::<Vec<AuditEntry>>()
            .await
            .map_err(|err| PortalError::Malformed(err.to_string()))
    }
}
