#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use vendorconnect_api::auth::hash_password;
use vendorconnect_api::config::MembershipConfig;
use vendorconnect_api::membership::{MembershipClient, MembershipError, MembershipStatus};
use vendorconnect_api::middleware::MembershipGate;
use vendorconnect_api::models::{AdminRecord, Credential, Scope, Task, User};
use vendorconnect_api::routes::app;
use vendorconnect_api::state::AppState;
use vendorconnect_api::store::memory::MemoryStore;

/// Membership stub with per-email status. Emails without an entry are
/// reported active.
pub struct StubMembership {
    statuses: Mutex<HashMap<String, MembershipStatus>>,
}

impl StubMembership {
    pub fn new() -> Self {
        Self {
            statuses: Mutex::new(HashMap::new()),
        }
    }

    pub fn set(&self, email: &str, status: MembershipStatus) {
        self.statuses
            .lock()
            .unwrap()
            .insert(email.to_string(), status);
    }
}

#[async_trait]
impl MembershipClient for StubMembership {
    async fn status_for(&self, email: &str) -> Result<MembershipStatus, MembershipError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(email)
            .copied()
            .unwrap_or(MembershipStatus::Active))
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub membership: Arc<StubMembership>,
    pub owner: User,
    pub member: User,
    pub open_task: Task,
    pub completed_task: Task,
}

pub const OWNER_PASSWORD: &str = "owner-pass";
pub const MEMBER_PASSWORD: &str = "member-pass";

/// Full pipeline over in-memory stores; the membership gate is armed
/// (service key configured, demo mode off).
pub fn test_app() -> TestApp {
    test_app_with(false, Some("svc-key"))
}

pub fn test_app_with(demo_mode: bool, membership_api_key: Option<&str>) -> TestApp {
    let store = Arc::new(MemoryStore::new());
    let membership = Arc::new(StubMembership::new());

    let owner = User {
        id: Uuid::new_v4(),
        name: "Olive Owner".into(),
        email: "owner@acme.test".into(),
        password_hash: hash_password(OWNER_PASSWORD),
    };
    let member = User {
        id: Uuid::new_v4(),
        name: "Manny Member".into(),
        email: "member@acme.test".into(),
        password_hash: hash_password(MEMBER_PASSWORD),
    };

    store.add_admin(AdminRecord {
        id: Uuid::new_v4(),
        user_id: owner.id,
        company_name: "Acme LLC".into(),
    });

    let open_task = Task {
        id: Uuid::new_v4(),
        title: "Open task".into(),
        status: "open".into(),
        completed: false,
        archived: false,
        assignee_ids: vec![member.id],
    };
    let completed_task = Task {
        id: Uuid::new_v4(),
        title: "Done task".into(),
        status: "done".into(),
        completed: true,
        archived: false,
        assignee_ids: vec![member.id],
    };
    store.add_task(open_task.clone());
    store.add_task(completed_task.clone());

    for credential in seed_credentials(&owner, &member) {
        store.add_credential(credential);
    }
    store.add_user(owner.clone());
    store.add_user(member.clone());

    let gate = Arc::new(MembershipGate::new(
        MembershipConfig {
            demo_mode,
            api_key: membership_api_key.map(String::from),
            base_url: "http://unused.test".into(),
            exempt_paths: MembershipConfig::exempt_route_trio(),
        },
        membership.clone(),
    ));

    let state = AppState::from_memory(store.clone(), gate, "/login");

    TestApp {
        router: app(state),
        store,
        membership,
        owner,
        member,
        open_task,
        completed_task,
    }
}

fn seed_credentials(owner: &User, member: &User) -> Vec<Credential> {
    let base = |key: &str, user_id: Uuid, scopes: Vec<Scope>| Credential {
        id: Uuid::new_v4(),
        key: key.to_string(),
        user_id,
        scopes,
        is_active: true,
        expires_at: None,
        last_used_at: None,
    };

    let mut expired = base("key-expired", member.id, vec![Scope::Read]);
    expired.expires_at = Some(Utc::now() - Duration::hours(1));

    let mut inactive = base("key-inactive", member.id, vec![Scope::Read]);
    inactive.is_active = false;

    vec![
        base("key-read", member.id, vec![Scope::Read]),
        base("key-wild", member.id, vec![Scope::Wildcard]),
        base("key-empty", member.id, vec![]),
        base("key-owner", owner.id, vec![Scope::Wildcard]),
        expired,
        inactive,
    ]
}

/// Drive one request through the router; returns status, parsed JSON body
/// (Null when empty or not JSON) and response headers.
pub async fn send(
    router: &Router,
    method: Method,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<Value>,
) -> Result<(StatusCode, Value, HeaderMap)> {
    let mut builder = Request::builder().method(method).uri(path);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&json)?))?,
        None => builder.body(Body::empty())?,
    };

    let response = router.clone().oneshot(request).await?;
    let status = response.status();
    let response_headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Ok((status, value, response_headers))
}

/// Log in and return the issued session token.
pub async fn login(router: &Router, email: &str, password: &str) -> Result<String> {
    let (status, body, _) = send(
        router,
        Method::POST,
        "/api/v1/auth/login",
        &[],
        Some(serde_json::json!({ "email": email, "password": password })),
    )
    .await?;

    anyhow::ensure!(status == StatusCode::CREATED, "login failed: {status} {body}");
    Ok(body["data"]["token"]
        .as_str()
        .expect("login response carries a token")
        .to_string())
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
