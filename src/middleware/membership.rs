use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::auth::{AuthContext, AuthMethod};
use crate::config::MembershipConfig;
use crate::error::ApiError;
use crate::membership::{MembershipClient, MembershipStatus};
use crate::state::AppState;
use crate::store::UserStore;

/// Shown to suspended tenant owners; the body also carries the
/// `membership_suspended` flag so clients can route to a dedicated view.
pub const SUSPENDED_MESSAGE: &str =
    "Your Mastermind membership is not active. VendorConnect is only available to active members.";

/// Outcome of one gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// One of the skip conditions applied; the service was not consulted.
    Skipped,
    /// Owner with an active membership, or the service could not answer.
    Allowed,
    /// Owner whose membership has lapsed.
    Suspended,
}

/// Subscription check for tenant owners. Billing is enforced once per
/// tenant, at the owner; team members always pass.
pub struct MembershipGate {
    config: MembershipConfig,
    client: Arc<dyn MembershipClient>,
}

impl MembershipGate {
    pub fn new(config: MembershipConfig, client: Arc<dyn MembershipClient>) -> Self {
        Self { config, client }
    }

    fn is_exempt(&self, path: &str) -> bool {
        let path = path.trim_start_matches('/');
        self.config
            .exempt_paths
            .iter()
            .any(|p| p.trim_start_matches('/') == path)
    }

    pub async fn evaluate(
        &self,
        path: &str,
        identity: Option<&AuthContext>,
        users: &dyn UserStore,
    ) -> GateOutcome {
        if self.config.demo_mode {
            return GateOutcome::Skipped;
        }
        if self.config.api_key.is_none() {
            return GateOutcome::Skipped;
        }
        if self.is_exempt(path) {
            return GateOutcome::Skipped;
        }

        // Only session-authenticated callers are gated; API-key traffic is
        // governed by scopes alone.
        let user = match identity {
            Some(ctx) if matches!(ctx.method, AuthMethod::Session { .. }) => &ctx.user,
            _ => return GateOutcome::Skipped,
        };

        let admin = match users.admin_for_user(user.id).await {
            Ok(Some(admin)) => admin,
            // No admin record: a team member, never gated.
            Ok(None) => return GateOutcome::Skipped,
            Err(e) => {
                tracing::error!(user_id = %user.id, "admin lookup failed, passing gate: {}", e);
                return GateOutcome::Allowed;
            }
        };

        match self.client.status_for(&user.email).await {
            Ok(MembershipStatus::Active) => GateOutcome::Allowed,
            Ok(MembershipStatus::Inactive) | Ok(MembershipStatus::NotFound) => {
                tracing::warn!(
                    user_id = %user.id,
                    email = %user.email,
                    admin_id = %admin.id,
                    company = %admin.company_name,
                    "blocking request: membership not active"
                );
                GateOutcome::Suspended
            }
            Err(e) => {
                // Service faults are an infrastructure problem, not a lapsed
                // subscription; the owner keeps access.
                tracing::error!(
                    user_id = %user.id,
                    email = %user.email,
                    "membership service unavailable, passing gate: {}",
                    e
                );
                GateOutcome::Allowed
            }
        }
    }
}

pub async fn membership_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, Response> {
    let identity = request.extensions().get::<AuthContext>().cloned();
    let outcome = state
        .membership_gate
        .evaluate(
            request.uri().path(),
            identity.as_ref(),
            state.users.as_ref(),
        )
        .await;

    if outcome == GateOutcome::Suspended {
        return Err(ApiError::membership_suspended(SUSPENDED_MESSAGE).into_response());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::membership::MembershipError;
    use crate::models::{AdminRecord, User};
    use crate::store::memory::MemoryStore;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct FixedClient(Result<MembershipStatus, ()>);

    #[async_trait]
    impl MembershipClient for FixedClient {
        async fn status_for(&self, _email: &str) -> Result<MembershipStatus, MembershipError> {
            self.0
                .map_err(|_| MembershipError::Http("down".to_string()))
        }
    }

    fn gate(demo: bool, api_key: Option<&str>, status: Result<MembershipStatus, ()>) -> MembershipGate {
        MembershipGate::new(
            MembershipConfig {
                demo_mode: demo,
                api_key: api_key.map(String::from),
                base_url: "http://unused".into(),
                exempt_paths: MembershipConfig::exempt_route_trio(),
            },
            Arc::new(FixedClient(status)),
        )
    }

    fn owner_context(store: &MemoryStore) -> AuthContext {
        let user = User {
            id: Uuid::new_v4(),
            name: "Owner".into(),
            email: "owner@example.com".into(),
            password_hash: String::new(),
        };
        store.add_user(user.clone());
        store.add_admin(AdminRecord {
            id: Uuid::new_v4(),
            user_id: user.id,
            company_name: "Acme".into(),
        });
        AuthContext {
            user,
            method: AuthMethod::Session {
                token: "tok".into(),
            },
        }
    }

    #[tokio::test]
    async fn demo_mode_skips() {
        let store = MemoryStore::new();
        let ctx = owner_context(&store);
        let gate = gate(true, Some("k"), Ok(MembershipStatus::Inactive));
        let outcome = gate.evaluate("/api/v1/tasks", Some(&ctx), &store).await;
        assert_eq!(outcome, GateOutcome::Skipped);
    }

    #[tokio::test]
    async fn missing_service_key_skips() {
        let store = MemoryStore::new();
        let ctx = owner_context(&store);
        let gate = gate(false, None, Ok(MembershipStatus::Inactive));
        let outcome = gate.evaluate("/api/v1/tasks", Some(&ctx), &store).await;
        assert_eq!(outcome, GateOutcome::Skipped);
    }

    #[tokio::test]
    async fn exempt_paths_skip_even_for_suspended_owner() {
        let store = MemoryStore::new();
        let ctx = owner_context(&store);
        let gate = gate(false, Some("k"), Ok(MembershipStatus::Inactive));
        for path in ["/api/v1/auth/login", "api/v1/auth/forgot-password"] {
            let outcome = gate.evaluate(path, Some(&ctx), &store).await;
            assert_eq!(outcome, GateOutcome::Skipped, "path {path}");
        }
    }

    #[tokio::test]
    async fn team_member_skips_regardless_of_status() {
        let store = MemoryStore::new();
        let user = User {
            id: Uuid::new_v4(),
            name: "Member".into(),
            email: "member@example.com".into(),
            password_hash: String::new(),
        };
        store.add_user(user.clone());
        let ctx = AuthContext {
            user,
            method: AuthMethod::Session {
                token: "tok".into(),
            },
        };
        let gate = gate(false, Some("k"), Ok(MembershipStatus::Inactive));
        let outcome = gate.evaluate("/api/v1/tasks", Some(&ctx), &store).await;
        assert_eq!(outcome, GateOutcome::Skipped);
    }

    #[tokio::test]
    async fn lapsed_owner_is_suspended_and_active_owner_passes() {
        let store = MemoryStore::new();
        let ctx = owner_context(&store);

        let lapsed = gate(false, Some("k"), Ok(MembershipStatus::Inactive));
        assert_eq!(
            lapsed.evaluate("/api/v1/tasks", Some(&ctx), &store).await,
            GateOutcome::Suspended
        );

        let active = gate(false, Some("k"), Ok(MembershipStatus::Active));
        assert_eq!(
            active.evaluate("/api/v1/tasks", Some(&ctx), &store).await,
            GateOutcome::Allowed
        );
    }

    #[tokio::test]
    async fn service_error_passes_the_owner() {
        let store = MemoryStore::new();
        let ctx = owner_context(&store);
        let gate = gate(false, Some("k"), Err(()));
        assert_eq!(
            gate.evaluate("/api/v1/tasks", Some(&ctx), &store).await,
            GateOutcome::Allowed
        );
    }
}
