use super::session::SessionState;

/// Client-side paths of the funnel and the customer portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppRoute {
    Search,
    Audit,
    Checkout,
    Login,
    Dashboard,
}

impl AppRoute {
    pub const ALL: [AppRoute; 5] = [
        AppRoute::Search,
        AppRoute::Audit,
        AppRoute::Checkout,
        AppRoute::Login,
        AppRoute::Dashboard,
    ];

    pub fn path(self) -> &'static str {
        match self {
            AppRoute::Search => "/",
            AppRoute::Audit => "/audit",
            AppRoute::Checkout => "/checkout",
            AppRoute::Login => "/portal/login",
            AppRoute::Dashboard => "/portal/dashboard",
        }
    }

    /// Unknown paths fall back to the search page.
    pub fn resolve(path: &str) -> AppRoute {
        let path = path
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };
        Self::ALL
            .into_iter()
            .find(|route| route.path() == path)
            .unwrap_or(AppRoute::Search)
    }

    pub fn requires_session(self) -> bool {
        matches!(self, AppRoute::Dashboard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(AppRoute),
    /// Auth state not known yet; show a spinner.
    Pending,
    Redirect(AppRoute),
}

pub fn guard(route: AppRoute, state: &SessionState) -> Navigation {
    if !route.requires_session() {
        return Navigation::Render(route);
    }
    match state {
        SessionState::Loading => Navigation::Pending,
        SessionState::SignedOut => Navigation::Redirect(AppRoute::Login),
        SessionState::SignedIn(_) => Navigation::Render(route),
    }
}
