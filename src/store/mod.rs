//! Persistence traits for the access pipeline.
//!
//! Middleware only ever sees these traits; the concrete backend is either
//! Postgres (`postgres::PgStore`) or the in-memory store used by demo mode
//! and the test suite (`memory::MemoryStore`).

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{AdminRecord, Credential, Session, Task, TaskAssignmentActivity, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Query(other.to_string()),
        }
    }
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Exact-match lookup by key string.
    async fn find_by_key(&self, key: &str) -> Result<Option<Credential>, StoreError>;

    /// Stamp last use. Runs on every successful key resolution, regardless
    /// of how the rest of the pipeline treats the request.
    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create(&self, session: Session) -> Result<(), StoreError>;

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    /// Advance last activity for a live session. Closed or unknown tokens
    /// are a no-op; the timestamp never moves backwards.
    async fn touch_activity(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn close(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Tenant-owner record for the user, if any. Absence means team member.
    async fn admin_for_user(&self, user_id: Uuid) -> Result<Option<AdminRecord>, StoreError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn set_status(&self, id: Uuid, status: &str) -> Result<Option<Task>, StoreError>;
}

#[async_trait]
pub trait TaskActivityStore: Send + Sync {
    /// Upsert the engagement timestamp for (task, user). The store itself
    /// re-checks that the task is neither completed nor archived; returns
    /// whether a row was actually written.
    async fn record_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    async fn last_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TaskAssignmentActivity>, StoreError>;
}
