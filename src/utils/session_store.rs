use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use dashmap::DashMap;
use tokio::{
    task::{AbortHandle, JoinHandle},
    time::{Instant, MissedTickBehavior},
};

use crate::models::session::{Session, SessionId};

/// Idle lifetime of a session that never received tokens (an abandoned login).
pub const PENDING_SESSION_TTL: Duration = Duration::from_secs(10 * 60);

/// In-memory sessions keyed by the id carried in the session cookie.
///
/// Each entry owns its pending silent-refresh task. Replacing the task or
/// dropping the entry aborts it, so no timer outlives its session.
///
/// Entries expire after `ttl` without a request, or after
/// [`PENDING_SESSION_TTL`] while they hold no tokens. Expired entries are
/// invisible to lookups and are reclaimed by [`SessionStore::evict_expired`].
pub struct SessionStore {
    sessions: DashMap<SessionId, SessionEntry>,
    ttl: Duration,
    pending_ttl: Duration,
}

struct SessionEntry {
    session: Session,
    refresh: Option<RefreshTimer>,
    last_seen: Instant,
}

impl SessionEntry {
    fn new() -> Self {
        Self {
            session: Session::default(),
            refresh: None,
            last_seen: Instant::now(),
        }
    }
}

struct RefreshTimer {
    exp: i64,
    handle: Option<AbortHandle>,
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self::with_ttls(ttl, PENDING_SESSION_TTL)
    }

    pub fn with_ttls(ttl: Duration, pending_ttl: Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            pending_ttl,
        }
    }

    pub fn create(&self) -> SessionId {
        let id = SessionId::generate();
        self.sessions.insert(id.clone(), SessionEntry::new());
        id
    }

    /// Whether `id` names a live session. Does not extend its lifetime.
    pub fn contains(&self, id: &SessionId) -> bool {
        let now = Instant::now();
        self.sessions
            .get(id)
            .is_some_and(|entry| !self.is_expired(&entry, now))
    }

    /// Marks the session as used. Returns `false`, and drops the entry, when
    /// it has already expired.
    pub fn touch(&self, id: &SessionId) -> bool {
        let now = Instant::now();
        if let Some(mut entry) = self.sessions.get_mut(id) {
            if !self.is_expired(&entry, now) {
                entry.last_seen = now;
                return true;
            }
        }
        self.sessions
            .remove_if(id, |_, entry| self.is_expired(entry, now));
        false
    }

    /// Drops every expired entry, aborting its refresh task. Returns how
    /// many were removed.
    pub fn evict_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.sessions.len();
        self.sessions
            .retain(|_, entry| !self.is_expired(entry, now));
        before.saturating_sub(self.sessions.len())
    }

    fn is_expired(&self, entry: &SessionEntry, now: Instant) -> bool {
        let ttl = if entry.session.has_tokens() {
            self.ttl
        } else {
            self.pending_ttl
        };
        now.saturating_duration_since(entry.last_seen) >= ttl
    }

    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).map(|entry| entry.session.clone())
    }

    /// Applies `f` to the stored session. `None` when the session is gone.
    pub fn update<R>(&self, id: &SessionId, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        self.sessions
            .get_mut(id)
            .map(|mut entry| f(&mut entry.session))
    }

    /// Removes the session and aborts its refresh task.
    pub fn invalidate(&self, id: &SessionId) -> Option<Session> {
        self.sessions.remove(id).map(|(_, mut entry)| {
            entry.refresh = None;
            let session = entry.session.clone();
            entry.session.clear();
            session
        })
    }

    pub fn is_refresh_armed_for(&self, id: &SessionId, exp: i64) -> bool {
        self.sessions
            .get(id)
            .and_then(|entry| entry.refresh.as_ref().map(|timer| timer.exp == exp))
            .unwrap_or(false)
    }

    /// Attaches a refresh task to the session, aborting any previous one.
    /// If the session no longer exists the task is aborted and `false` returned.
    pub fn arm_refresh(&self, id: &SessionId, exp: i64, handle: AbortHandle) -> bool {
        match self.sessions.get_mut(id) {
            Some(mut entry) => {
                entry.refresh = Some(RefreshTimer {
                    exp,
                    handle: Some(handle),
                });
                true
            }
            None => {
                handle.abort();
                false
            }
        }
    }

    /// Detaches the refresh task without aborting it. Called by the task
    /// itself once its timer has fired.
    pub fn release_refresh(&self, id: &SessionId) {
        if let Some(mut entry) = self.sessions.get_mut(id) {
            if let Some(mut timer) = entry.refresh.take() {
                timer.handle = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// Periodically evicts expired sessions. Stops once the store is dropped.
pub fn spawn_sweeper(store: &Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    let store: Weak<SessionStore> = Arc::downgrade(store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let Some(store) = store.upgrade() else {
                break;
            };
            let evicted = store.evict_expired();
            if evicted > 0 {
                tracing::debug!(evicted, remaining = store.len(), "expired sessions evicted");
            }
        }
    })
}
