use axum::{
    extract::Request,
    http::Method,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::models::{Credential, Scope};

/// Policy for keys with no scopes at all: treat them as unrestricted.
/// This mirrors the shipped behavior; flip deliberately if keys should
/// default-deny instead.
pub const EMPTY_SCOPES_ALLOW_ALL: bool = true;

/// Fixed method-to-capability table. Methods outside it have no capability
/// and are always denied for API keys.
pub fn capability_for_method(method: &Method) -> Option<Scope> {
    match *method {
        Method::GET => Some(Scope::Read),
        Method::POST => Some(Scope::Create),
        Method::PUT | Method::PATCH => Some(Scope::Update),
        Method::DELETE => Some(Scope::Delete),
        _ => None,
    }
}

/// Whether a scope list permits a method.
pub fn scopes_permit(scopes: &[Scope], method: &Method) -> bool {
    if scopes.is_empty() {
        return EMPTY_SCOPES_ALLOW_ALL;
    }
    match capability_for_method(method) {
        Some(capability) => {
            scopes.contains(&capability) || scopes.contains(&Scope::Wildcard)
        }
        None => false,
    }
}

/// Scope check for API-key requests. Session-authenticated requests carry
/// no `Credential` extension and pass through untouched.
pub async fn permission_middleware(request: Request, next: Next) -> Result<Response, Response> {
    let Some(credential) = request.extensions().get::<Credential>().cloned() else {
        return Ok(next.run(request).await);
    };

    if !scopes_permit(&credential.scopes, request.method()) {
        tracing::warn!(
            credential_id = %credential.id,
            method = %request.method(),
            "API key denied by scope check"
        );
        return Err(ApiError::forbidden(
            "API key does not have permission for this HTTP method",
        )
        .into_response());
    }

    Ok(next.run(request).await)
}
