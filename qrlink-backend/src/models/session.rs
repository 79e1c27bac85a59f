use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored states of a login session. `expired` is never stored; it is the
/// store's absence-on-lookup outcome once a session has been swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Pending,
    Authenticated,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authenticated => "authenticated",
        }
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Correlation record binding a login attempt on one device to confirmation
/// from another. Keyed by `id` across the store, the notification channel,
/// and the QR payload shown to the scanning device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSession {
    pub id: String,
    pub status: SessionStatus,
    pub user: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoginSession {
    /// Age at `now`, used by the sweep to apply the status-specific TTL.
    pub fn age(&self, now: DateTime<Utc>) -> chrono::Duration {
        now.signed_duration_since(self.created_at)
    }
}
