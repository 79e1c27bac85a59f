//! Per-session live connections
//!
//! At most one observer per session id. A new binding supersedes and closes
//! any previous one; delivery to an unbound id is a silent drop, with no
//! retry or buffering.

use actix_ws::{CloseCode, CloseReason, Session};
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;

use super::protocol::SessionEvent;

/// Push failed after a binding was found. Callers log and move on.
#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("event serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("connection closed")]
    Closed,
}

struct BoundConnection {
    conn_id: Uuid,
    session: Session,
}

#[derive(Default)]
pub struct ConnectionRegistry {
    connections: DashMap<String, BoundConnection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: DashMap::new(),
        }
    }

    /// Register `ws` as the live observer for a session. Last writer wins:
    /// any previous binding is closed on its own task, never left dangling.
    /// The returned id lets the owning poll loop release only its own
    /// binding on disconnect.
    pub fn bind(&self, session_id: &str, ws: Session) -> Uuid {
        let conn_id = Uuid::new_v4();
        let previous = self.connections.insert(
            session_id.to_string(),
            BoundConnection {
                conn_id,
                session: ws,
            },
        );
        if let Some(prev) = previous {
            log::debug!("superseding channel binding for session {}", session_id);
            tokio::spawn(async move {
                let _ = prev.session.close(Some(CloseCode::Policy.into())).await;
            });
        }
        conn_id
    }

    /// Best-effort delivery to the bound observer, if any. A missing binding
    /// drops the event silently.
    pub async fn send(&self, session_id: &str, event: &SessionEvent) -> Result<(), DeliveryError> {
        // Clone the sender out so no map guard is held across the await.
        let Some(mut ws) = self
            .connections
            .get(session_id)
            .map(|bound| bound.session.clone())
        else {
            return Ok(());
        };
        let body = serde_json::to_string(event)?;
        ws.text(body).await.map_err(|_| DeliveryError::Closed)
    }

    /// Drop the binding installed under `conn_id`. No-op when a newer
    /// connection has already superseded it.
    pub fn unbind_if(&self, session_id: &str, conn_id: Uuid) -> bool {
        self.connections
            .remove_if(session_id, |_, bound| bound.conn_id == conn_id)
            .is_some()
    }

    /// Remove the binding and close the underlying connection. Used by the
    /// sweep and logout paths.
    pub async fn evict(&self, session_id: &str, reason: CloseReason) {
        if let Some((_, bound)) = self.connections.remove(session_id) {
            let _ = bound.session.close(Some(reason)).await;
        }
    }

    pub fn is_bound(&self, session_id: &str) -> bool {
        self.connections.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_without_binding_is_silent_noop() {
        let registry = ConnectionRegistry::new();

        assert!(registry.send("missing", &SessionEvent::expired()).await.is_ok());
        assert!(!registry.is_bound("missing"));
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_evict_without_binding_is_noop() {
        let registry = ConnectionRegistry::new();

        registry.evict("missing", CloseCode::Normal.into()).await;
        assert!(!registry.unbind_if("missing", Uuid::new_v4()));
    }
}
