//! Password reset endpoints: request the mailed link, then consume it.

use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::types::{
    rate_limited, ForgotPasswordRequest, ForgotPasswordResponse, ResetPasswordRequest,
    ResetPasswordResponse,
};
use crate::api::email::EmailMessage;
use crate::api::handlers::{extract_client_ip, normalize_email};
use crate::credential::password::hash_password;
use crate::credential::{AuthError, TokenSlot};

fn reset_email(to_email: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Reset your password".to_string(),
        html: format!(
            "<p>A password reset was requested for this address. \
             <a href=\"{link}\">Choose a new password</a> within 15 minutes, \
             or ignore this mail to keep the current one.</p>"
        ),
    }
}

/// Issue a reset token and mail the link.
#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = ForgotPasswordResponse),
        (status = 400, description = "Missing payload", body = super::types::ErrorBody),
        (status = 404, description = "Unknown email", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store or mail provider unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::Validation("Missing payload").into_response();
    };

    let email = normalize_email(&request.email);
    if email.is_empty() {
        return AuthError::Validation("Email is required").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::ForgotPassword)
        == RateLimitDecision::Limited
        || state
            .rate_limiter()
            .check_email(&email, RateLimitAction::ForgotPassword)
            == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    match send_reset_link(&state, &email).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn send_reset_link(
    state: &AuthState,
    email: &str,
) -> Result<ForgotPasswordResponse, AuthError> {
    let mut account = state
        .store()
        .find_by_email(email)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::NotFound)?;

    let token = state
        .lifecycle()
        .issue(
            &mut account,
            TokenSlot::PasswordReset,
            state.config().reset_token_ttl_seconds(),
        )
        .await?;
    let link = format!(
        "{}/auth/reset-password?token={token}",
        state.config().frontend_base_url()
    );

    state
        .mailer()
        .send(&reset_email(&account.email, &link))
        .await
        .map_err(|err| AuthError::Upstream(err.context("failed to send password reset email")))?;

    info!(account_id = %account.id, "password reset requested");
    Ok(ForgotPasswordResponse {
        message: "Password reset email sent. Check your inbox.".to_string(),
    })
}

/// Consume the reset token and store the new password digest.
#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced", body = ResetPasswordResponse),
        (status = 400, description = "Missing fields or invalid/expired token", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::Validation("Missing payload").into_response();
    };
    let token = request.token.trim();
    if token.is_empty() {
        return AuthError::Validation("Reset token is required").into_response();
    }
    if request.new_password.is_empty() {
        return AuthError::Validation("New password is required").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::ResetPassword)
        == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    match replace_password(&state, token, &request.new_password).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn replace_password(
    state: &AuthState,
    token: &str,
    new_password: &str,
) -> Result<ResetPasswordResponse, AuthError> {
    let mut account = state
        .lifecycle()
        .consume(TokenSlot::PasswordReset, token)
        .await?;

    account.password_digest = Some(hash_password(new_password)?);
    state
        .store()
        .save(&account)
        .await
        .map_err(AuthError::from)?;

    info!(account_id = %account.id, "password reset");
    Ok(ResetPasswordResponse {
        message: "Password has been reset. You can now sign in.".to_string(),
    })
}
