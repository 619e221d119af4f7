use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Bearer session issued at login and closed at logout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub logged_in_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    pub logged_out_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn open(token: String, user_id: Uuid, now: DateTime<Utc>) -> Self {
        Self {
            token,
            user_id,
            logged_in_at: now,
            last_activity_at: now,
            logged_out_at: None,
        }
    }

    /// A session authenticates while it has not been logged out.
    pub fn is_live(&self) -> bool {
        self.logged_out_at.is_none()
    }
}
