use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;

use super::routes::{guard, AppRoute, Navigation};
use super::session::{Session, SessionProvider};

/// One audit the customer ordered, as stored by the managed backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditEntry {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub data_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub cleanup_status: Vec<CleanupStatus>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupStatus {
    pub current_status: String,
}

impl AuditEntry {
    pub fn current_status(&self) -> Option<&str> {
        self.cleanup_status
            .first()
            .map(|status| status.current_status.as_str())
    }

    pub fn stage(&self) -> CleanupStage {
        CleanupStage::from_status(self.current_status())
    }

    /// First eight characters of the external identifier.
    pub fn short_id(&self) -> String {
        self.data_id
            .as_deref()
            .unwrap_or_default()
            .chars()
            .take(8)
            .collect()
    }
}

pub const IN_REVIEW_STATUS: &str = "In Prüfung";
pub const SUBMITTED_STATUS: &str = "Eingereicht";
pub const REMOVED_STATUS: &str = "Gelöscht";

/// Three-step progress shown per audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CleanupStage {
    Analyse,
    Einreichung,
    Bereinigt,
}

impl CleanupStage {
    pub const ALL: [CleanupStage; 3] = [
        CleanupStage::Analyse,
        CleanupStage::Einreichung,
        CleanupStage::Bereinigt,
    ];

    pub fn from_status(status: Option<&str>) -> Self {
        match status.map(str::trim) {
            Some(REMOVED_STATUS) => CleanupStage::Bereinigt,
            Some(SUBMITTED_STATUS) => CleanupStage::Einreichung,
            _ => CleanupStage::Analyse,
        }
    }

    /// Whether the step is lit for the given backend status. Submission shows
    /// as reached for every status except the review state, including none.
    pub fn is_reached(self, status: Option<&str>) -> bool {
        let status = status.map(str::trim);
        match self {
            CleanupStage::Analyse => true,
            CleanupStage::Einreichung => status != Some(IN_REVIEW_STATUS),
            CleanupStage::Bereinigt => status == Some(REMOVED_STATUS),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CleanupStage::Analyse => "Analyse",
            CleanupStage::Einreichung => "Einreichung",
            CleanupStage::Bereinigt => "Bereinigt",
        }
    }

    pub fn progress_percent(self) -> u8 {
        match self {
            CleanupStage::Analyse => 33,
            CleanupStage::Einreichung => 66,
            CleanupStage::Bereinigt => 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageStep {
    pub label: &'static str,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardCard {
    pub id: String,
    pub company_name: String,
    pub address: String,
    pub short_id: String,
    pub status: Option<String>,
    pub stage: CleanupStage,
    pub progress_percent: u8,
    pub steps: Vec<StageStep>,
}

impl From<&AuditEntry> for DashboardCard {
    fn from(entry: &AuditEntry) -> Self {
        let stage = entry.stage();
        let status = entry.current_status();
        Self {
            id: entry.id.clone(),
            company_name: entry.company_name.clone(),
            address: entry.address.clone(),
            short_id: entry.short_id(),
            status: entry.current_status().map(str::to_string),
            stage,
            progress_percent: stage.progress_percent(),
            steps: CleanupStage::ALL
                .into_iter()
                .map(|step| StageStep {
                    label: step.label(),
                    active: step.is_reached(status),
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardView {
    pub user_id: String,
    pub entries: Vec<DashboardCard>,
}

impl DashboardView {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortalError {
    #[error("sign-in required")]
    Unauthenticated,
    #[error("customer portal is not configured")]
    NotConfigured,
    #[error("portal backend returned status {0}")]
    Status(u16),
    #[error("portal backend unreachable: {0}")]
    Transport(String),
    #[error("portal backend sent an unexpected payload: {0}")]
    Malformed(String),
}

/// Read access to the customer's audit history.
#[async_trait]
pub trait DashboardStore: Send + Sync {
    async fn audits_for(&self, session: &Session) -> Result<Vec<AuditEntry>, PortalError>;
}

/// Login-gated customer area composed from an injected session provider.
pub struct Portal<P: ?Sized, S: ?Sized> {
    sessions: Arc<P>,
    store: Arc<S>,
}

impl<P, S> Portal<P, S>
where
    P: SessionProvider + ?Sized,
    S: DashboardStore + ?Sized,
{
    pub fn new(sessions: Arc<P>, store: Arc<S>) -> Self {
        Self { sessions, store }
    }

    pub fn navigate(&self, path: &str) -> Navigation {
        guard(AppRoute::resolve(path), &self.sessions.session())
    }

    pub async fn dashboard(&self) -> Result<DashboardView, PortalError> {
        let state = self.sessions.session();
        let session = state.session().ok_or(PortalError::Unauthenticated)?;
        let audits = self.store.audits_for(session).await?;
        tracing::debug!(user = %session.user_id, audits = audits.len(), "dashboard loaded");

        Ok(DashboardView {
            user_id: session.user_id.clone(),
            entries: audits.iter().map(DashboardCard::from).collect(),
        })
    }

    pub fn sign_out(&self) {
        self.sessions.sign_out();
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(value) => Ok(value),
        serde_json::Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<CleanupStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<CleanupStatus>>::deserialize(deserializer)?.unwrap_or_default())
}
