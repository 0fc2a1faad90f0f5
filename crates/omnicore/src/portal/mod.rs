//! Customer portal: identity session, route gating and the cleanup dashboard.

pub mod client;
pub mod dashboard;
pub mod routes;
pub mod session;

pub use client::PortalClient;
pub use dashboard::{
    AuditEntry, CleanupStage, CleanupStatus, DashboardCard, DashboardStore, DashboardView, Portal,
    PortalError, StageStep,
};
pub use routes::{guard, AppRoute, Navigation};
pub use session::{
    InMemorySessionProvider, Session, SessionListener, SessionProvider, SessionState,
    Subscription,
};
