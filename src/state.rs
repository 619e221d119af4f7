use std::sync::Arc;

use crate::middleware::membership::MembershipGate;
use crate::store::memory::MemoryStore;
use crate::store::postgres::PgStore;
use crate::store::{CredentialStore, SessionStore, TaskActivityStore, TaskStore, UserStore};

/// Shared application state handed to every middleware and handler.
/// Stores are trait objects so the same pipeline runs against Postgres,
/// the in-memory demo store, or test doubles.
#[derive(Clone)]
pub struct AppState {
    pub credentials: Arc<dyn CredentialStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub users: Arc<dyn UserStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub task_activity: Arc<dyn TaskActivityStore>,
    pub membership_gate: Arc<MembershipGate>,
    pub login_path: String,
}

impl AppState {
    pub fn from_postgres(
        store: PgStore,
        membership_gate: Arc<MembershipGate>,
        login_path: impl Into<String>,
    ) -> Self {
        let store = Arc::new(store);
        Self {
            credentials: store.clone(),
            sessions: store.clone(),
            users: store.clone(),
            tasks: store.clone(),
            task_activity: store,
            membership_gate,
            login_path: login_path.into(),
        }
    }

    pub fn from_memory(
        store: Arc<MemoryStore>,
        membership_gate: Arc<MembershipGate>,
        login_path: impl Into<String>,
    ) -> Self {
        Self {
            credentials: store.clone(),
            sessions: store.clone(),
            users: store.clone(),
            tasks: store.clone(),
            task_activity: store,
            membership_gate,
            login_path: login_path.into(),
        }
    }
}
