//! In-memory store used by demo mode and the test suite.
//!
//! Single-process only. All maps live behind one mutex per collection;
//! no lock is held across an await point.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{
    CredentialStore, SessionStore, StoreError, TaskActivityStore, TaskStore, UserStore,
};
use crate::models::{AdminRecord, Credential, Session, Task, TaskAssignmentActivity, User};

#[derive(Default)]
pub struct MemoryStore {
    credentials: Mutex<HashMap<String, Credential>>,
    sessions: Mutex<HashMap<String, Session>>,
    users: Mutex<HashMap<Uuid, User>>,
    admins: Mutex<HashMap<Uuid, AdminRecord>>, // keyed by user_id
    tasks: Mutex<HashMap<Uuid, Task>>,
    task_activity: Mutex<HashMap<(Uuid, Uuid), TaskAssignmentActivity>>,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    pub fn add_admin(&self, admin: AdminRecord) {
        self.admins.lock().unwrap().insert(admin.user_id, admin);
    }

    pub fn add_credential(&self, credential: Credential) {
        self.credentials
            .lock()
            .unwrap()
            .insert(credential.key.clone(), credential);
    }

    pub fn add_task(&self, task: Task) {
        self.tasks.lock().unwrap().insert(task.id, task);
    }

    /// Make timestamp writes fail until reset. Lets tests exercise the
    /// "tracking failure never surfaces" contract without a real outage.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn credential_by_key(&self, key: &str) -> Option<Credential> {
        self.credentials.lock().unwrap().get(key).cloned()
    }

    pub fn session_by_token(&self, token: &str) -> Option<Session> {
        self.sessions.lock().unwrap().get(token).cloned()
    }

    fn write_guard(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_key(&self, key: &str) -> Result<Option<Credential>, StoreError> {
        Ok(self.credentials.lock().unwrap().get(key).cloned())
    }

    async fn touch_last_used(&self, id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut credentials = self.credentials.lock().unwrap();
        if let Some(credential) = credentials.values_mut().find(|c| c.id == id) {
            credential.last_used_at = Some(at);
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create(&self, session: Session) -> Result<(), StoreError> {
        self.write_guard()?;
        self.sessions
            .lock()
            .unwrap()
            .insert(session.token.clone(), session);
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.lock().unwrap().get(token).cloned())
    }

    async fn touch_activity(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(token) {
            if session.is_live() && at > session.last_activity_at {
                session.last_activity_at = at;
            }
        }
        Ok(())
    }

    async fn close(&self, token: &str, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.write_guard()?;
        let mut sessions = self.sessions.lock().unwrap();
        if let Some(session) = sessions.get_mut(token) {
            if session.is_live() {
                session.logged_out_at = Some(at);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn admin_for_user(&self, user_id: Uuid) -> Result<Option<AdminRecord>, StoreError> {
        Ok(self.admins.lock().unwrap().get(&user_id).cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tasks.lock().unwrap().get(&id).cloned())
    }

    async fn set_status(&self, id: Uuid, status: &str) -> Result<Option<Task>, StoreError> {
        self.write_guard()?;
        let mut tasks = self.tasks.lock().unwrap();
        match tasks.get_mut(&id) {
            Some(task) => {
                task.status = status.to_string();
                Ok(Some(task.clone()))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl TaskActivityStore for MemoryStore {
    async fn record_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.write_guard()?;

        // Write-time re-check of task state, mirroring the SQL upsert guard.
        let accepts = self
            .tasks
            .lock()
            .unwrap()
            .get(&task_id)
            .map_or(false, |t| t.accepts_activity());
        if !accepts {
            return Ok(false);
        }

        let mut activity = self.task_activity.lock().unwrap();
        let entry = activity
            .entry((task_id, user_id))
            .or_insert(TaskAssignmentActivity {
                task_id,
                user_id,
                last_activity_at: at,
            });
        if at > entry.last_activity_at {
            entry.last_activity_at = at;
        }
        Ok(true)
    }

    async fn last_activity(
        &self,
        task_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TaskAssignmentActivity>, StoreError> {
        Ok(self
            .task_activity
            .lock()
            .unwrap()
            .get(&(task_id, user_id))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(completed: bool, archived: bool) -> Task {
        Task {
            id: Uuid::new_v4(),
            title: "t".into(),
            status: "open".into(),
            completed,
            archived,
            assignee_ids: vec![],
        }
    }

    #[tokio::test]
    async fn task_activity_skips_completed_tasks() {
        let store = MemoryStore::new();
        let done = task(true, false);
        let open = task(false, false);
        let user = Uuid::new_v4();
        store.add_task(done.clone());
        store.add_task(open.clone());

        assert!(!store
            .record_activity(done.id, user, Utc::now())
            .await
            .unwrap());
        assert!(store
            .record_activity(open.id, user, Utc::now())
            .await
            .unwrap());
        assert!(store.last_activity(done.id, user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn session_touch_is_monotone() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let session = Session::open("tok".into(), Uuid::new_v4(), now);
        store.create(session).await.unwrap();

        let earlier = now - chrono::Duration::minutes(5);
        store.touch_activity("tok", earlier).await.unwrap();
        assert_eq!(
            store.session_by_token("tok").unwrap().last_activity_at,
            now
        );

        let later = now + chrono::Duration::minutes(5);
        store.touch_activity("tok", later).await.unwrap();
        assert_eq!(
            store.session_by_token("tok").unwrap().last_activity_at,
            later
        );
    }

    #[tokio::test]
    async fn closed_session_is_not_touched() {
        let store = MemoryStore::new();
        let now = Utc::now();
        store
            .create(Session::open("tok".into(), Uuid::new_v4(), now))
            .await
            .unwrap();
        store.close("tok", now).await.unwrap();

        store
            .touch_activity("tok", now + chrono::Duration::minutes(1))
            .await
            .unwrap();
        assert_eq!(
            store.session_by_token("tok").unwrap().last_activity_at,
            now
        );
    }
}
