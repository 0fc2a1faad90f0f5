use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

/// Signed-in customer as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub access_token: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// The provider has not reported yet.
    Loading,
    SignedOut,
    SignedIn(Session),
}

impl SessionState {
    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::SignedIn(session) => Some(session),
            SessionState::Loading | SessionState::SignedOut => None,
        }
    }
}

pub type SessionListener = Box<dyn Fn(&SessionState) + Send + Sync>;

/// Ambient auth state, injected where pages need it.
pub trait SessionProvider: Send + Sync {
    fn session(&self) -> SessionState;
    fn on_change(&self, listener: SessionListener) -> Subscription;
    fn sign_out(&self);
}

/// Listener registration; dropping it unregisters the listener.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

type ListenerMap = BTreeMap<u64, Arc<SessionListener>>;

/// Process-local provider fed by whoever completes the sign-in.
pub struct InMemorySessionProvider {
    state: RwLock<SessionState>,
    listeners: Arc<Mutex<ListenerMap>>,
    next_id: AtomicU64,
}

impl Default for InMemorySessionProvider {
    fn default() -> Self {
        Self::new(SessionState::Loading)
    }
}

impl InMemorySessionProvider {
    pub fn new(initial: SessionState) -> Self {
        Self {
            state: RwLock::new(initial),
            listeners: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn signed_in(session: Session) -> Self {
        Self::new(SessionState::SignedIn(session))
    }

    pub fn sign_in(&self, session: Session) {
        self.set(SessionState::SignedIn(session));
    }

    /// Resolve a pending `Loading` state to signed out.
    pub fn finish_loading(&self) {
        let loading = matches!(self.session(), SessionState::Loading);
        if loading {
            self.set(SessionState::SignedOut);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn set(&self, next: SessionState) {
        {
            let mut guard = self.state.write().unwrap_or_else(PoisonError::into_inner);
            *guard = next.clone();
        }
        let listeners: Vec<Arc<SessionListener>> = self
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        for listener in listeners {
            (**listener)(&next);
        }
    }
}

impl SessionProvider for InMemorySessionProvider {
    fn session(&self) -> SessionState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn on_change(&self, listener: SessionListener) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Arc::new(listener));

        let registry = Arc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(registry) = registry.upgrade() {
                registry
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .remove(&id);
            }
        })
    }

    fn sign_out(&self) {
        self.set(SessionState::SignedOut);
    }
}
