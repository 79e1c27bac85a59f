//! Login handshake coordination
//!
//! Orchestrates the QR login state machine: session creation, cross-device
//! confirmation, logout, and the periodic eviction sweep. Store mutation
//! always comes first; channel notification is best-effort and never fails
//! the caller.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use actix_ws::CloseCode;
use chrono::Duration;
use serde_json::json;
use thiserror::Error;
use tokio::sync::oneshot;

use crate::gateway::ConnectionRegistry;
use crate::gateway::protocol::SessionEvent;
use crate::models::{LoginSession, SessionStatus};
use crate::store::SessionStore;
use crate::tokens::{TokenError, TokenService};

#[derive(Debug, Error)]
pub enum HandshakeError {
    #[error("unknown or expired session")]
    SessionNotFound,
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// TTL policy applied by the sweep: short for pending sessions (a displayed
/// QR code goes stale quickly), long for authenticated ones so a
/// scanned-but-undelivered confirmation survives until the browser repolls.
#[derive(Debug, Clone, Copy)]
pub struct SweepPolicy {
    pub pending_ttl: Duration,
    pub authenticated_ttl: Duration,
    pub interval: StdDuration,
}

pub struct LoginCoordinator {
    store: Arc<SessionStore>,
    connections: Arc<ConnectionRegistry>,
    tokens: Arc<TokenService>,
    policy: SweepPolicy,
}

impl LoginCoordinator {
    pub fn new(
        store: Arc<SessionStore>,
        connections: Arc<ConnectionRegistry>,
        tokens: Arc<TokenService>,
        policy: SweepPolicy,
    ) -> Self {
        Self {
            store,
            connections,
            tokens,
            policy,
        }
    }

    pub fn store(&self) -> Arc<SessionStore> {
        self.store.clone()
    }

    pub fn connections(&self) -> Arc<ConnectionRegistry> {
        self.connections.clone()
    }

    /// Start a login attempt: a fresh pending session plus the payload the
    /// page encodes into the QR code for the scanning device.
    pub fn start_login(&self) -> (LoginSession, String) {
        let session = self.store.create();
        let payload = json!({ "session_id": session.id }).to_string();
        log::info!("login session {} created", session.id);
        (session, payload)
    }

    pub fn check_session(&self, session_id: &str) -> Option<LoginSession> {
        self.store.get(session_id)
    }

    /// Status snapshot for one channel poll. Authenticated replies carry a
    /// freshly minted short-window token.
    pub fn poll_snapshot(&self, session_id: &str) -> Result<SessionEvent, TokenError> {
        match self.store.get(session_id) {
            None => Ok(SessionEvent::expired()),
            Some(session) => match session.status {
                SessionStatus::Pending => Ok(SessionEvent::pending()),
                SessionStatus::Authenticated => {
                    let user = session.user.unwrap_or_default();
                    let token = self.tokens.issue_poll_token(&user)?;
                    Ok(SessionEvent::authenticated(&user, &token))
                }
            },
        }
    }

    /// Confirmation from the second device. Store mutation first, then a
    /// best-effort push down the channel; a push failure is only logged
    /// since the confirmation itself already succeeded.
    pub async fn confirm(
        &self,
        session_id: &str,
        subject: &str,
    ) -> Result<(String, String), HandshakeError> {
        let session = self
            .store
            .authenticate(session_id, subject)
            .ok_or(HandshakeError::SessionNotFound)?;
        let user = session.user.unwrap_or_else(|| subject.to_string());
        let token = self.tokens.issue_confirm_token(&user)?;
        log::info!("session {} authenticated as {}", session_id, user);

        if let Err(e) = self
            .connections
            .send(session_id, &SessionEvent::authenticated(&user, &token))
            .await
        {
            log::warn!("websocket notify failed for session {}: {}", session_id, e);
        }
        Ok((user, token))
    }

    /// Logout always reports success, even when nothing existed.
    pub async fn logout(&self, session_id: &str) {
        if self.store.remove(session_id) {
            log::info!("session {} logged out", session_id);
        }
        if let Err(e) = self
            .connections
            .send(session_id, &SessionEvent::logout())
            .await
        {
            log::warn!("websocket notify failed for session {}: {}", session_id, e);
        }
        self.connections
            .evict(session_id, CloseCode::Normal.into())
            .await;
    }

    /// One eviction pass. Per-entry delivery failures are logged and do not
    /// abort the rest of the pass.
    pub async fn sweep_once(&self) {
        let evicted = self
            .store
            .sweep(self.policy.pending_ttl, self.policy.authenticated_ttl);
        if evicted.is_empty() {
            return;
        }
        log::info!("sweep evicted {} session(s)", evicted.len());
        for id in evicted {
            if let Err(e) = self.connections.send(&id, &SessionEvent::expired()).await {
                log::warn!("expiry notice undeliverable for session {}: {}", id, e);
            }
            self.connections.evict(&id, CloseCode::Normal.into()).await;
        }
    }

    /// Background eviction worker, started once at boot. Runs until the
    /// shutdown signal fires or its sender is dropped on process exit.
    pub async fn run_sweeper(self: Arc<Self>, mut shutdown_rx: oneshot::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.policy.interval);
        // The first tick completes immediately; consume it so the loop
        // sweeps on the interval, not at startup.
        ticker.tick().await;
        loop {
            tokio::select! {
                _ = ticker.tick() => self.sweep_once().await,
                _ = &mut shutdown_rx => {
                    log::info!("session sweeper shutting down");
                    break;
                }
            }
        }
    }
}
