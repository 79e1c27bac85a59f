//! Session store
//!
//! Authoritative in-memory state for every pending/authenticated login
//! session. Nothing survives a restart; the periodic sweep is the only
//! timeout authority for session lifetime.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::models::{LoginSession, SessionStatus};

/// Session map keyed by id. DashMap's per-entry shard locking serializes
/// create/get/authenticate/remove/sweep on the same id.
#[derive(Default)]
pub struct SessionStore {
    sessions: DashMap<String, LoginSession>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Allocate a fresh pending session under a new uuid. Ids are never
    /// reused.
    pub fn create(&self) -> LoginSession {
        let session = LoginSession {
            id: Uuid::new_v4().to_string(),
            status: SessionStatus::Pending,
            user: None,
            created_at: Utc::now(),
        };
        self.sessions.insert(session.id.clone(), session.clone());
        session
    }

    pub fn get(&self, session_id: &str) -> Option<LoginSession> {
        self.sessions.get(session_id).map(|s| s.clone())
    }

    /// Transition to authenticated, binding `user` and restarting the expiry
    /// clock. Idempotent: re-confirming refreshes the user and timestamp.
    pub fn authenticate(&self, session_id: &str, user: &str) -> Option<LoginSession> {
        self.sessions.get_mut(session_id).map(|mut s| {
            s.status = SessionStatus::Authenticated;
            s.user = Some(user.to_string());
            s.created_at = Utc::now();
            s.clone()
        })
    }

    /// Delete the session; returns whether it existed.
    pub fn remove(&self, session_id: &str) -> bool {
        self.sessions.remove(session_id).is_some()
    }

    /// Evict every session older than its status's TTL and return the
    /// evicted ids. Expiry is re-checked under the entry lock so a racing
    /// `authenticate` is never swept away.
    pub fn sweep(&self, pending_ttl: Duration, authenticated_ttl: Duration) -> Vec<String> {
        let now = Utc::now();
        let ttl_for = |s: &LoginSession| match s.status {
            SessionStatus::Pending => pending_ttl,
            SessionStatus::Authenticated => authenticated_ttl,
        };

        let stale: Vec<String> = self
            .sessions
            .iter()
            .filter(|entry| entry.value().age(now) > ttl_for(entry.value()))
            .map(|entry| entry.key().clone())
            .collect();

        let mut evicted = Vec::new();
        for id in stale {
            if self
                .sessions
                .remove_if(&id, |_, s| s.age(now) > ttl_for(s))
                .is_some()
            {
                evicted.push(id);
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Shift a session's creation time into the past.
    #[cfg(test)]
    pub fn backdate(&self, session_id: &str, by: Duration) {
        if let Some(mut s) = self.sessions.get_mut(session_id) {
            s.created_at = s.created_at - by;
        }
    }
}
