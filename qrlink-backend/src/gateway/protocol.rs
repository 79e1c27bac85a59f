//! Notification channel wire protocol
//!
//! Every inbound frame from the browser is a poll trigger; the reply (and
//! any server-initiated push) is one JSON status object.

use serde::{Deserialize, Serialize};

/// Wire status of a session snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Authenticated,
    Expired,
    Logout,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
            Self::Logout => "logout",
        }
    }
}

impl std::fmt::Display for EventStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Status object delivered to the waiting browser. `user` and `token` are
/// only present on authenticated snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEvent {
    pub status: EventStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl SessionEvent {
    pub fn pending() -> Self {
        Self {
            status: EventStatus::Pending,
            user: None,
            token: None,
        }
    }

    pub fn authenticated(user: &str, token: &str) -> Self {
        Self {
            status: EventStatus::Authenticated,
            user: Some(user.to_string()),
            token: Some(token.to_string()),
        }
    }

    pub fn expired() -> Self {
        Self {
            status: EventStatus::Expired,
            user: None,
            token: None,
        }
    }

    pub fn logout() -> Self {
        Self {
            status: EventStatus::Logout,
            user: None,
            token: None,
        }
    }
}
