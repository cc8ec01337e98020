//! Per-session context for authenticated actors.
//!
//! A user's sessions share one expiry notifier. It is cancelled between poll cycles when
//! the last session closes or expires, or when the registry shuts down.

pub mod router;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::NotifierConfig;
use crate::listings::ListingRepository;
use crate::notifier::{ExpiryNotifier, Notification, NotificationReceiver};
use crate::users::{User, UserId};

/// Sessions live a day unless configured otherwise.
pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

pub use router::session_router;

/// Opaque bearer token identifying a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(pub Uuid);

impl SessionToken {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Reads `Authorization: Bearer <token>`; anything malformed yields `None`.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        Uuid::parse_str(token).ok().map(Self)
    }
}

impl std::fmt::Display for SessionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a handler knows about the caller.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: SessionToken,
    pub user: User,
    pub opened_at: DateTime<Utc>,
    notifications: NotificationReceiver,
}

impl SessionContext {
    pub fn notification(&self) -> Option<Notification> {
        self.notifications.borrow().clone()
    }

    pub fn subscribe(&self) -> NotificationReceiver {
        self.notifications.clone()
    }
}

/// One notifier per user, shared by all of that user's sessions.
struct SharedNotifier {
    receiver: NotificationReceiver,
    cancel: CancellationToken,
    sessions: usize,
}

#[derive(Default)]
struct RegistryState {
    sessions: HashMap<SessionToken, SessionContext>,
    notifiers: HashMap<UserId, SharedNotifier>,
}

impl RegistryState {
    /// Drops the session and stops its notifier once the user has no sessions left.
    fn release(&mut self, token: SessionToken) -> Option<SessionContext> {
        let context = self.sessions.remove(&token)?;
        let user_id = context.user.id;
        let idle = match self.notifiers.get_mut(&user_id) {
            Some(notifier) => {
                notifier.sessions = notifier.sessions.saturating_sub(1);
                notifier.sessions == 0
            }
            None => false,
        };
        if idle {
            if let Some(notifier) = self.notifiers.remove(&user_id) {
                notifier.cancel.cancel();
                debug!(user_id = user_id.0, "expiry notifier released");
            }
        }
        Some(context)
    }

    fn evict_expired(&mut self, now: DateTime<Utc>, ttl: Duration) -> usize {
        let expired: Vec<SessionToken> = self
            .sessions
            .values()
            .filter(|context| context.opened_at + ttl <= now)
            .map(|context| context.token)
            .collect();
        for token in &expired {
            self.release(*token);
        }
        expired.len()
    }
}

pub struct SessionRegistry<R> {
    repository: Arc<R>,
    config: NotifierConfig,
    ttl: Duration,
    shutdown: CancellationToken,
    state: Mutex<RegistryState>,
}

impl<R> SessionRegistry<R>
where
    R: ListingRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: NotifierConfig) -> Self {
        Self::with_shutdown(repository, config, CancellationToken::new())
    }

    /// Sessions are cancelled together with `shutdown`.
    pub fn with_shutdown(
        repository: Arc<R>,
        config: NotifierConfig,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            repository,
            config,
            ttl: Duration::hours(DEFAULT_SESSION_TTL_HOURS),
            shutdown,
            state: Mutex::new(RegistryState::default()),
        }
    }

    /// Sessions older than `ttl` are treated as closed.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Starts a session, reusing the user's notifier when one is already running.
    /// Must be called inside a tokio runtime.
    pub fn open(&self, user: User) -> SessionContext {
        let token = SessionToken::generate();
        let opened_at = Utc::now();
        let mut state = self.state.lock().expect("session mutex poisoned");

        let evicted = state.evict_expired(opened_at, self.ttl);
        if evicted > 0 {
            debug!(evicted, "expired sessions evicted");
        }

        let notifications = match state.notifiers.get_mut(&user.id) {
            Some(notifier) => {
                notifier.sessions += 1;
                notifier.receiver.clone()
            }
            None => {
                let cancel = self.shutdown.child_token();
                let (notifier, receiver) =
                    ExpiryNotifier::new(Arc::clone(&self.repository), user.id, self.config);
                notifier.spawn(cancel.clone());
                state.notifiers.insert(
                    user.id,
                    SharedNotifier {
                        receiver: receiver.clone(),
                        cancel,
                        sessions: 1,
                    },
                );
                receiver
            }
        };

        let context = SessionContext {
            token,
            user,
            opened_at,
            notifications,
        };
        state.sessions.insert(token, context.clone());

        info!(user_id = context.user.id.0, %token, "session opened");
        context
    }

    /// Expired sessions resolve to `None` and are closed on the spot.
    pub fn resolve(&self, token: SessionToken) -> Option<SessionContext> {
        let mut state = self.state.lock().expect("session mutex poisoned");
        let context = state.sessions.get(&token)?.clone();
        if context.opened_at + self.ttl <= Utc::now() {
            state.release(token);
            info!(user_id = context.user.id.0, %token, "session expired");
            return None;
        }
        Some(context)
    }

    pub fn notification(&self, token: SessionToken) -> Option<Notification> {
        self.resolve(token)
            .and_then(|context| context.notification())
    }

    /// Returns `false` for unknown tokens.
    pub fn close(&self, token: SessionToken) -> bool {
        let released = self
            .state
            .lock()
            .expect("session mutex poisoned")
            .release(token);

        match released {
            Some(context) => {
                info!(user_id = context.user.id.0, %token, "session closed");
                true
            }
            None => false,
        }
    }

    /// Cancels every notifier and forgets all sessions.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let mut state = self.state.lock().expect("session mutex poisoned");
        let count = state.sessions.len();
        state.sessions.clear();
        state.notifiers.clear();
        info!(sessions = count, "session registry shut down");
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("session mutex poisoned").sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of running expiry notifiers, at most one per user.
    pub fn notifier_count(&self) -> usize {
        self.state.lock().expect("session mutex poisoned").notifiers.len()
    }
}
