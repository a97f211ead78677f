//! Bearer-token guard for protected routes.

use axum::http::{header::AUTHORIZATION, HeaderMap};
use uuid::Uuid;

use super::state::AuthState;
use crate::credential::{AuthError, Role};

/// The authenticated caller, resolved from a live access token and confirmed
/// against the store.
#[derive(Clone, Debug)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
    pub role: Role,
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            value
                .strip_prefix("Bearer ")
                .or_else(|| value.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Verifies the `Authorization: Bearer` access token and resolves the account
/// behind it. Any failure collapses to [`AuthError::Unauthorized`] so callers
/// cannot probe which step rejected them.
pub async fn require_auth(headers: &HeaderMap, state: &AuthState) -> Result<Principal, AuthError> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(AuthError::Unauthorized);
    };
    let claims = state.sessions().verify_access(token)?;
    let account = state
        .store()
        .find_by_id(claims.sub)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::Unauthorized)?;
    Ok(Principal {
        account_id: account.id,
        email: account.email,
        role: account.role,
    })
}
