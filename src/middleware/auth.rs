use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use crate::error::ApiError;
use crate::models::User;
use crate::state::AppState;

/// Authenticated caller, injected into request extensions before any
/// route logic runs. Downstream middleware branches on `method`.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub user: User,
    pub method: AuthMethod,
}

#[derive(Clone, Debug)]
pub enum AuthMethod {
    /// Authenticated via `X-API-Key`; the credential id links back to the
    /// key whose scopes the permission check will consult.
    ApiKey { credential_id: uuid::Uuid },
    /// Authenticated via a bearer session token.
    Session { token: String },
}

/// Identity-resolution middleware. An `X-API-Key` header routes through the
/// credential path; otherwise the bearer session path applies.
pub async fn authenticate_middleware(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    if let Some(raw_key) = headers.get("x-api-key") {
        let key = raw_key.to_str().map_err(|_| {
            ApiError::unauthorized("Invalid or inactive API key").into_response()
        })?;

        let credential = state
            .credentials
            .find_by_key(key)
            .await
            .map_err(|e| ApiError::from(e).into_response())?
            .ok_or_else(|| {
                tracing::warn!("API key authentication failed: unknown key");
                ApiError::unauthorized("Invalid or inactive API key").into_response()
            })?;

        if !credential.is_usable(Utc::now()) {
            // Deactivated keys get the generic message; the expiry wording is
            // reserved for keys that are still active but past their expiry.
            let message = if credential.is_active {
                "API key has expired or is inactive"
            } else {
                "Invalid or inactive API key"
            };
            tracing::warn!(credential_id = %credential.id, "API key rejected: expired or inactive");
            return Err(ApiError::unauthorized(message).into_response());
        }

        // Last-used stamp happens on every successful resolution, even if a
        // later middleware rejects the request on permission grounds.
        if let Err(e) = state
            .credentials
            .touch_last_used(credential.id, Utc::now())
            .await
        {
            tracing::error!(credential_id = %credential.id, "failed to stamp API key last use: {}", e);
        }

        let user = state
            .users
            .find_by_id(credential.user_id)
            .await
            .map_err(|e| ApiError::from(e).into_response())?
            .ok_or_else(|| {
                // Owner gone means the key no longer authenticates anyone.
                tracing::warn!(credential_id = %credential.id, "API key owner no longer exists");
                ApiError::unauthorized("Invalid or inactive API key").into_response()
            })?;

        request.extensions_mut().insert(AuthContext {
            user,
            method: AuthMethod::ApiKey {
                credential_id: credential.id,
            },
        });
        request.extensions_mut().insert(credential);

        return Ok(next.run(request).await);
    }

    // Session path
    let token = match extract_bearer_token(&headers) {
        Ok(token) => token,
        Err(reason) => {
            return Err(session_failure(&state, &headers, request.uri().path(), reason));
        }
    };

    let session = state
        .sessions
        .find_by_token(&token)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    let session = match session.filter(|s| s.is_live()) {
        Some(session) => session,
        None => {
            return Err(session_failure(
                &state,
                &headers,
                request.uri().path(),
                "Session is not active",
            ));
        }
    };

    let user = state
        .users
        .find_by_id(session.user_id)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;

    let user = match user {
        Some(user) => user,
        None => {
            return Err(session_failure(
                &state,
                &headers,
                request.uri().path(),
                "Session is not active",
            ));
        }
    };

    request.extensions_mut().insert(AuthContext {
        user,
        method: AuthMethod::Session { token },
    });

    Ok(next.run(request).await)
}

/// Extract a bearer token from the Authorization header.
fn extract_bearer_token(headers: &HeaderMap) -> Result<String, &'static str> {
    let auth_header = headers
        .get("authorization")
        .ok_or("Missing Authorization header")?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format")?;

    if let Some(token) = auth_str.strip_prefix("Bearer ") {
        if token.trim().is_empty() {
            return Err("Empty bearer token");
        }
        Ok(token.to_string())
    } else {
        Err("Authorization header must use Bearer token format")
    }
}

/// JSON clients get a bare 401; browser clients get sent to the login view.
fn session_failure(state: &AppState, headers: &HeaderMap, path: &str, reason: &str) -> Response {
    tracing::debug!(path, "session authentication failed: {}", reason);

    if expects_json(headers, path) {
        ApiError::unauthorized("Unauthenticated").into_response()
    } else {
        Redirect::to(&state.login_path).into_response()
    }
}

/// API paths and JSON `Accept` headers both mark a request as JSON-expecting.
fn expects_json(headers: &HeaderMap, path: &str) -> bool {
    if path.starts_with("/api") {
        return true;
    }
    headers
        .get("accept")
        .and_then(|v| v.to_str().ok())
        .map_or(false, |accept| accept.contains("json"))
}
