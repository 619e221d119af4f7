use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Account record. Credentials and sessions belong to exactly one user;
/// removing the user invalidates both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Tenant-owner record. Only users with one of these are subject to the
/// membership gate; team members of the same tenant never are.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub company_name: String,
}
