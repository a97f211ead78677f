//! Refresh-token rotation and logout endpoints.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::debug;

use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::types::{
    rate_limited, LogoutRequest, LogoutResponse, RefreshTokenRequest, RefreshTokenResponse,
};
use crate::api::handlers::extract_client_ip;
use crate::credential::AuthError;

/// Rotate a refresh token into a fresh access + refresh pair. The presented
/// token is retired even when it was the live one.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh-token",
    request_body = RefreshTokenRequest,
    responses(
        (status = 200, description = "New token pair", body = RefreshTokenResponse),
        (status = 400, description = "Missing, invalid or expired refresh token", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn refresh_token(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RefreshTokenRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::Validation("Missing payload").into_response();
    };
    let presented = request.refresh_token.trim();
    if presented.is_empty() {
        return AuthError::Validation("Refresh token is required").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::RefreshToken)
        == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    match state.sessions().rotate_refresh(presented).await {
        Ok(pair) => (
            StatusCode::OK,
            Json(RefreshTokenResponse {
                access_token: pair.access,
                refresh_token: pair.refresh,
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Clear the refresh slot. Idempotent: unknown or absent tokens still log out.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Logged out", body = LogoutResponse),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn logout(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LogoutRequest>>,
) -> impl IntoResponse {
    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Logout)
        == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    let presented = payload.and_then(|Json(request)| request.refresh_token);
    if let Some(token) = presented.as_deref().map(str::trim) {
        if !token.is_empty() {
            if let Err(err) = state.sessions().revoke_refresh(token).await {
                return err.into_response();
            }
            debug!("refresh slot cleared on logout");
        }
    }

    (
        StatusCode::OK,
        Json(LogoutResponse {
            message: "Logged out.".to_string(),
        }),
    )
        .into_response()
}
