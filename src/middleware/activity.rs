use axum::{
    extract::{RawPathParams, Request, State},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use uuid::Uuid;

use super::auth::{AuthContext, AuthMethod};
use crate::state::AppState;
use crate::store::{SessionStore, StoreError};

/// Best-effort activity tracking around the route handler. Session liveness
/// is stamped before the handler runs, task engagement strictly after it
/// returns. Both are observability, not business logic: every failure is
/// logged at debug level and discarded, and the response is never altered.
pub async fn activity_middleware(
    State(state): State<AppState>,
    params: RawPathParams,
    request: Request,
    next: Next,
) -> Response {
    let identity = request.extensions().get::<AuthContext>().cloned();
    let path = request.uri().path().to_string();
    let task_id = resolve_task_param(&params);

    if let Some(ctx) = &identity {
        if let AuthMethod::Session { token } = &ctx.method {
            if let Err(e) = track_session_activity(state.sessions.as_ref(), token).await {
                tracing::debug!(user_id = %ctx.user.id, path, "session activity tracking failed: {}", e);
            }
        }
    }

    let response = next.run(request).await;

    if let (Some(ctx), Some(task_id)) = (identity, task_id) {
        if is_task_resource(&path) {
            if let Err(e) = track_task_activity(&state, &ctx, task_id).await {
                tracing::debug!(user_id = %ctx.user.id, path, "task activity tracking failed: {}", e);
            }
        }
    }

    response
}

/// Canonical route parameter is `task_id`; `id` is accepted as an ordered
/// fallback for routes that predate the rename.
fn resolve_task_param(params: &RawPathParams) -> Option<Uuid> {
    let raw = params
        .iter()
        .find(|(name, _)| *name == "task_id")
        .or_else(|| params.iter().find(|(name, _)| *name == "id"))
        .map(|(_, value)| value)?;

    Uuid::parse_str(raw).ok()
}

fn is_task_resource(path: &str) -> bool {
    path.split('/').any(|segment| segment == "tasks")
}

async fn track_session_activity(
    sessions: &dyn SessionStore,
    token: &str,
) -> Result<(), StoreError> {
    // The store only touches live sessions; closed tokens are a no-op.
    sessions.touch_activity(token, Utc::now()).await
}

async fn track_task_activity(
    state: &AppState,
    ctx: &AuthContext,
    task_id: Uuid,
) -> Result<(), StoreError> {
    let Some(task) = state.tasks.find_by_id(task_id).await? else {
        return Ok(());
    };

    // Only assigned members generate engagement; the store re-checks that
    // the task still accepts activity at write time.
    if !task.is_assigned(ctx.user.id) {
        return Ok(());
    }

    state
        .task_activity
        .record_activity(task_id, ctx.user.id, Utc::now())
        .await?;
    Ok(())
}
