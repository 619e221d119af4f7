use axum::{
    extract::{Extension, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::{generate_session_token, hash_password};
use crate::error::ApiError;
use crate::middleware::auth::{AuthContext, AuthMethod};
use crate::middleware::response::{ApiResponse, ApiResult};
use crate::models::Session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// POST /api/v1/auth/login - validate credentials and issue a session token.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<LoginResponse> {
    let user = state
        .users
        .find_by_email(&payload.email)
        .await?
        .filter(|u| u.password_hash == hash_password(&payload.password))
        .ok_or_else(|| {
            tracing::warn!(email = %payload.email, "login rejected: bad credentials");
            ApiError::unauthorized("Invalid email or password")
        })?;

    let session = Session::open(generate_session_token(), user.id, Utc::now());
    state.sessions.create(session.clone()).await?;

    tracing::debug!(user_id = %user.id, "session opened");

    Ok(ApiResponse::created(LoginResponse {
        token: session.token,
        user: UserView {
            id: user.id,
            name: user.name,
            email: user.email,
        },
    }))
}

/// DELETE /api/v1/auth/logout - close the calling session.
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<AuthContext>,
) -> ApiResult<Value> {
    if let AuthMethod::Session { token } = &ctx.method {
        state.sessions.close(token, Utc::now()).await?;
        tracing::debug!(user_id = %ctx.user.id, "session closed");
    }

    Ok(ApiResponse::success(json!({ "logged_out": true })))
}

/// GET /api/v1/auth/whoami - echo the resolved identity.
pub async fn whoami(Extension(ctx): Extension<AuthContext>) -> ApiResult<Value> {
    let auth_via = match ctx.method {
        AuthMethod::ApiKey { .. } => "api_key",
        AuthMethod::Session { .. } => "session",
    };

    Ok(ApiResponse::success(json!({
        "id": ctx.user.id,
        "name": ctx.user.name,
        "email": ctx.user.email,
        "auth_via": auth_via,
    })))
}

#[derive(Debug, Deserialize)]
pub struct RegisterCompanyRequest {
    pub company_name: String,
    pub email: String,
}

/// POST /api/v1/auth/register-company - acknowledgement stub; company
/// provisioning lives outside the access pipeline.
pub async fn register_company(
    Json(payload): Json<RegisterCompanyRequest>,
) -> ApiResult<Value> {
    tracing::debug!(company = %payload.company_name, "company registration received");
    Ok(ApiResponse::with_status(
        json!({ "received": true, "company_name": payload.company_name }),
        axum::http::StatusCode::ACCEPTED,
    ))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// POST /api/v1/auth/forgot-password - acknowledgement stub; mail delivery
/// is out of scope. Responds identically whether or not the email exists.
pub async fn forgot_password(
    Json(payload): Json<ForgotPasswordRequest>,
) -> ApiResult<Value> {
    tracing::debug!(email = %payload.email, "password reset requested");
    Ok(ApiResponse::success(
        json!({ "message": "If the account exists, a reset link has been sent" }),
    ))
}
