use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Capability granted to an API key. Keys carry a list of these;
/// `*` stands in for all of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Read,
    Create,
    Update,
    Delete,
    #[serde(rename = "*")]
    Wildcard,
}

impl Scope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(Scope::Read),
            "create" => Some(Scope::Create),
            "update" => Some(Scope::Update),
            "delete" => Some(Scope::Delete),
            "*" => Some(Scope::Wildcard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scope::Read => "read",
            Scope::Create => "create",
            Scope::Update => "update",
            Scope::Delete => "delete",
            Scope::Wildcard => "*",
        }
    }
}

/// Long-lived API key credential. Keys are administrator-issued and are
/// deactivated rather than deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: Uuid,
    pub key: String,
    pub user_id: Uuid,
    pub scopes: Vec<Scope>,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub last_used_at: Option<DateTime<Utc>>,
}

impl Credential {
    /// A key authenticates only while active and unexpired.
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.map_or(true, |exp| exp > now)
    }
}
