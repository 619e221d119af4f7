use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::Html,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers;
use crate::middleware::{
    activity_middleware, authenticate_middleware, membership_middleware, permission_middleware,
};
use crate::state::AppState;

/// Build the full router. Per-request order on protected routes:
/// authenticator -> permission evaluator -> membership gate ->
/// (session tracker) -> handler -> (task tracker).
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes(state.clone()))
        .merge(protected_routes(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Routes reachable without authentication: the membership-gate exempt trio.
fn public_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route(
            "/api/v1/auth/register-company",
            post(handlers::auth::register_company),
        )
        .route(
            "/api/v1/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .with_state(state)
}

fn protected_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/auth/whoami", get(handlers::auth::whoami))
        .route("/api/v1/auth/logout", delete(handlers::auth::logout))
        .route("/api/v1/tasks/:task_id", get(handlers::tasks::task_get))
        .route(
            "/api/v1/tasks/:task_id/status",
            put(handlers::tasks::task_status_put),
        )
        // Browser-facing view; exists so session failures outside /api
        // exercise the redirect-to-login path.
        .route("/dashboard", get(dashboard))
        // Layers run top-down in reverse order of addition: the
        // authenticator is added last so it runs first.
        .layer(from_fn_with_state(state.clone(), activity_middleware))
        .layer(from_fn_with_state(state.clone(), membership_middleware))
        .layer(from_fn(permission_middleware))
        .layer(from_fn_with_state(state.clone(), authenticate_middleware))
        .with_state(state)
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "VendorConnect API",
            "version": version,
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/api/v1/auth/* (login public, rest protected)",
                "tasks": "/api/v1/tasks/:task_id (protected)",
            }
        }
    }))
}

async fn health() -> axum::response::Json<Value> {
    axum::response::Json(json!({
        "success": true,
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
        }
    }))
}

async fn dashboard() -> Html<&'static str> {
    Html("<h1>VendorConnect</h1>")
}
