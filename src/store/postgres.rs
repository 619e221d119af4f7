//! Postgres-backed store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{
    CredentialStore, SessionStore, StoreError, TaskActivityStore, TaskStore, UserStore,
};
use crate::models::{AdminRecord, Credential, Scope, Session, Task, TaskAssignmentActivity, User};

/// One pool, all stores. Cloning is cheap; the pool is internally shared.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn scopes_from_row(raw: Vec<String>) -> Vec<Scope> {
    // Unknown scope strings are ignored rather than failing the lookup;
    // a key with only unknown scopes ends up with none of them granted.
    raw.iter().filter_map(|s| Scope::parse(s)).collect()
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Credential>, StoreError> {
        let query = r#"
            SELECT id, key, user_id, scopes, is_active, expires_at, last_used_at
            FROM api_keys
            WHERE key = $1
        "#;

        let row = sqlx::query(query)
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Credential {
            id: r.get("id"),
            key: r.get("key"),
            user_id: r.get("user_id"),
            scopes: scopes_from_row(r.get("scopes")),
            is_active: r.get("is_active"),
            expires_at: r.get("expires_at"),
            last_used_at: r.get("last_used_at"),
        }))
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        sqlx::query("UPDATE api_keys SET last_used_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO sessions (token, user_id, logged_in_at, last_activity_at, logged_out_at)
            VALUES ($1, $2, $3, $4, $5)
        "#;

        sqlx::query(query)
            .bind(&session.token)
            .bind(session.user_id)
            .bind(session.logged_in_at)
            .bind(session.last_activity_at)
            .bind(session.logged_out_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        let query = r#"
            SELECT token, user_id, logged_in_at, last_activity_at, logged_out_at
            FROM sessions
            WHERE token = $1
        "#;

        let row = sqlx::query(query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Session {
            token: r.get("token"),
            user_id: r.get("user_id"),
            logged_in_at: r.get("logged_in_at"),
            last_activity_at: r.get("last_activity_at"),
            logged_out_at: r.get("logged_out_at"),
        }))
    }

    async fn touch_activity(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        // GREATEST keeps the timestamp monotone under racing requests.
        let query = r#"
            UPDATE sessions
            SET last_activity_at = GREATEST(last_activity_at, $2)
            WHERE token = $1 AND logged_out_at IS NULL
        "#;

        sqlx::query(query)
            .bind(token)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        let query = r#"
            UPDATE sessions
            SET logged_out_at = $2
            WHERE token = $1 AND logged_out_at IS NULL
        "#;

        sqlx::query(query)
            .bind(token)
            .bind(at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let row = sqlx::query("SELECT id, name, email, password_hash FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            name: r.get("name"),
            email: r.get("email"),
            password_hash: r.get("password_hash"),
        }))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row =
            sqlx::query("SELECT id, name, email, password_hash FROM users WHERE email = $1")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            name: r.get("name"),
            email: r.get("email"),
            password_hash: r.get("password_hash"),
        }))
    }

    async fn admin_for_user(&self, user_id: Uuid) -> Result<Option<AdminRecord>, StoreError> {
        let row = sqlx::query("SELECT id, user_id, company_name FROM admins WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| AdminRecord {
            id: r.get("id"),
            user_id: r.get("user_id"),
            company_name: r.get("company_name"),
        }))
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        let query = r#"
            SELECT id, title, status, completed, archived
            FROM tasks
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let assignees =
            sqlx::query("SELECT user_id FROM task_assignments WHERE task_id = $1")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(Some(Task {
            id: row.get("id"),
            title: row.get("title"),
            status: row.get("status"),
            completed: row.get("completed"),
            archived: row.get("archived"),
            assignee_ids: assignees.iter().map(|r| r.get("user_id")).collect(),
        }))
    }

    async fn set_status(&self, id: Uuid, status: &str) -> Result<Option<Task>, StoreError> {
        let updated = sqlx::query("UPDATE tasks SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        TaskStore::find_by_id(self, id).await
    }
}

#[async_trait]
impl TaskActivityStore for PgStore {
    async fn record_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        // The SELECT re-checks task state at write time, so a task completed
        // between the middleware check and this write stays untouched.
        let query = r#"
            INSERT INTO task_activity (task_id, user_id, last_activity_at)
            SELECT t.id, $2, $3
            FROM tasks t
            WHERE t.id = $1 AND t.completed = false AND t.archived = false
            ON CONFLICT (task_id, user_id)
            DO UPDATE SET last_activity_at = GREATEST(task_activity.last_activity_at, EXCLUDED.last_activity_at)
        "#;

        let result = sqlx::query(query)
            .bind(task_id)
            .bind(user_id)
            .bind(at)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn last_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TaskAssignmentActivity>, StoreError> {
        let row = sqlx::query(
            "SELECT task_id, user_id, last_activity_at FROM task_activity WHERE task_id = $1 AND user_id = $2",
        )
        .bind(task_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| TaskAssignmentActivity {
            task_id: r.get("task_id"),
            user_id: r.get("user_id"),
            last_activity_at: r.get("last_activity_at"),
        }))
    }
}
