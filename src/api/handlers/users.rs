//! Guarded account listing.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::auth::principal::require_auth;
use super::auth::types::UserPayload;
use super::auth::AuthState;
use crate::credential::AuthError;

/// List every account as its public payload. Requires a live access token;
/// password digests and token material never leave the store.
#[utoipa::path(
    get,
    path = "/v1/users",
    responses(
        (status = 200, description = "All accounts, newest first", body = [UserPayload]),
        (status = 401, description = "Missing or invalid access token", body = super::auth::types::ErrorBody),
        (status = 503, description = "Store unavailable", body = super::auth::types::ErrorBody)
    ),
    tag = "users"
)]
pub async fn list_users(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let principal = match require_auth(&headers, &state).await {
        Ok(principal) => principal,
        Err(err) => return err.into_response(),
    };

    match state.store().list().await {
        Ok(accounts) => {
            debug!(
                caller = %principal.account_id,
                count = accounts.len(),
                "listed accounts"
            );
            let users: Vec<UserPayload> = accounts.iter().map(UserPayload::from).collect();
            (StatusCode::OK, Json(users)).into_response()
        }
        Err(err) => AuthError::from(err).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::AccountDraft;
    use anyhow::{Context, Result};
    use axum::body::to_bytes;
    use axum::http::{header::AUTHORIZATION, HeaderValue};

    #[tokio::test]
    async fn rejects_requests_without_a_token() {
        let state = AuthState::for_tests();
        let response = list_users(HeaderMap::new(), Extension(state))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn lists_public_payloads_newest_first() -> Result<()> {
        let state = AuthState::for_tests();
        let first = state
            .store()
            .create(AccountDraft::local(
                None,
                "first@example.com".to_string(),
                "digest".to_string(),
            ))
            .await?;
        state
            .store()
            .create(AccountDraft::federated(
                Some("Second".to_string()),
                "second@example.com".to_string(),
                "google".to_string(),
            ))
            .await?;

        let access = state.sessions().issue_access(&first)?;
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access}"))?,
        );

        let response = list_users(headers, Extension(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await?;
        let users: Vec<serde_json::Value> = serde_json::from_slice(&bytes)?;
        assert_eq!(users.len(), 2);

        // Newest first when creation times differ; public fields only.
        let fields: Vec<&str> = users[0]
            .as_object()
            .context("object payload")?
            .keys()
            .map(String::as_str)
            .collect();
        assert!(fields.contains(&"email"));
        assert!(!fields.contains(&"password_digest"));
        assert!(!fields.contains(&"refresh"));

        let emails: Vec<&str> = users
            .iter()
            .filter_map(|user| user["email"].as_str())
            .collect();
        assert!(emails.contains(&"first@example.com"));
        assert!(emails.contains(&"second@example.com"));
        Ok(())
    }
}
