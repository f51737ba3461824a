//! The signed in user, shared explicitly with everything that needs an owner
//! id.
//!
//! Authentication itself happens elsewhere. The auth client reports changes
//! through [SessionContext::sign_in], [SessionContext::sign_out] and
//! [SessionContext::refresh], and interested components subscribe to hear
//! about them.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Deserialize, Serialize};

use crate::{Error, user::UserId};

/// The signed in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The user's ID, used to scope every store call.
    pub user_id: UserId,
    /// The user's email address.
    pub email: String,
    /// The name shown in the interface.
    pub display_name: String,
}

/// A change to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user signed in.
    SignedIn(Session),
    /// The user signed out.
    SignedOut,
    /// The session was refreshed, e.g. a new access token or profile details.
    Refreshed(Session),
}

/// Identifies a listener registered with [SessionContext::subscribe].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

#[derive(Default)]
struct SessionState {
    current: Option<Session>,
    next_subscription: u64,
    listeners: BTreeMap<SubscriptionId, Listener>,
}

/// A cloneable handle to the current session. Clones share the same state.
#[derive(Clone, Default)]
pub struct SessionContext {
    state: Arc<Mutex<SessionState>>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SessionContext")
            .field("current", &state.current)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}

impl SessionContext {
    /// Create a context with nobody signed in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with `session` already signed in.
    pub fn signed_in(session: Session) -> Self {
        let context = Self::new();
        context.lock().current = Some(session);
        context
    }

    /// The signed in user, if any.
    pub fn current(&self) -> Option<Session> {
        self.lock().current.clone()
    }

    /// The signed in user's ID.
    ///
    /// # Errors
    /// Returns [Error::Unauthenticated] if nobody is signed in.
    pub fn require_user(&self) -> Result<UserId, Error> {
        self.lock()
            .current
            .as_ref()
            .map(|session| session.user_id)
            .ok_or(Error::Unauthenticated)
    }

    /// Record that `session` signed in and notify listeners.
    pub fn sign_in(&self, session: Session) {
        tracing::info!("User {} signed in", session.user_id);
        self.lock().current = Some(session.clone());
        self.notify(SessionEvent::SignedIn(session));
    }

    /// Record that the user signed out and notify listeners.
    pub fn sign_out(&self) {
        let previous = self.lock().current.take();

        if let Some(previous) = previous {
            tracing::info!("User {} signed out", previous.user_id);
            self.notify(SessionEvent::SignedOut);
        }
    }

    /// Replace the session details without changing who is signed in.
    pub fn refresh(&self, session: Session) {
        tracing::debug!("Session refreshed for user {}", session.user_id);
        self.lock().current = Some(session.clone());
        self.notify(SessionEvent::Refreshed(session));
    }

    /// Call `listener` on every future session change, in subscription order.
    pub fn subscribe(
        &self,
        listener: impl Fn(&SessionEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let mut state = self.lock();
        state.next_subscription += 1;
        let id = SubscriptionId(state.next_subscription);
        state.listeners.insert(id, Arc::new(listener));
        id
    }

    /// Stop notifying the listener registered as `id`. Unknown ids are
    /// ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().listeners.remove(&id);
    }

    fn notify(&self, event: SessionEvent) {
        // Listeners may call back into the context, so call them unlocked.
        let listeners: Vec<Listener> = self.lock().listeners.values().cloned().collect();

        for listener in listeners {
            listener(&event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
