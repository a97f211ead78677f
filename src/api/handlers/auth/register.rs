//! Registration and email verification endpoints.

use axum::{
    extract::{Extension, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::rate_limit::{RateLimitAction, RateLimitDecision};
use super::state::AuthState;
use super::types::{
    rate_limited, RegisterRequest, RegisterResponse, UserPayload, VerifyEmailParams,
    VerifyEmailResponse,
};
use crate::api::email::EmailMessage;
use crate::api::handlers::{extract_client_ip, normalize_email, valid_email};
use crate::credential::password::hash_password;
use crate::credential::{AccountDraft, AuthError, TokenSlot};

fn verification_email(to_email: &str, link: &str) -> EmailMessage {
    EmailMessage {
        to_email: to_email.to_string(),
        subject: "Verify your email address".to_string(),
        html: format!(
            "<p>Welcome to Atesti. Please <a href=\"{link}\">verify your email address</a>. \
             The link expires in one hour.</p>"
        ),
    }
}

/// Create an unverified local account and mail the verification link.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = RegisterResponse),
        (status = 400, description = "Missing or invalid payload", body = super::types::ErrorBody),
        (status = 409, description = "Email already registered", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store or mail provider unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn register(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::Validation("Missing payload").into_response();
    };

    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Register)
        == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    match create_account(&state, request).await {
        Ok(response) => (StatusCode::CREATED, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn create_account(
    state: &AuthState,
    request: RegisterRequest,
) -> Result<RegisterResponse, AuthError> {
    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return Err(AuthError::Validation("A valid email is required"));
    }
    if request.password.is_empty() {
        return Err(AuthError::Validation("Password is required"));
    }

    let digest = hash_password(&request.password)?;
    let mut account = state
        .store()
        .create(AccountDraft::local(request.name, email, digest))
        .await
        .map_err(AuthError::from)?;

    let token = state
        .lifecycle()
        .issue(
            &mut account,
            TokenSlot::EmailVerification,
            state.config().verify_token_ttl_seconds(),
        )
        .await?;
    let link = format!(
        "{}/auth/verify-email?token={token}",
        state.config().frontend_base_url()
    );

    // Mail failure surfaces as 503; the account stays created.
    state
        .mailer()
        .send(&verification_email(&account.email, &link))
        .await
        .map_err(|err| AuthError::Upstream(err.context("failed to send verification email")))?;

    info!(account_id = %account.id, "account registered");
    Ok(RegisterResponse {
        message: "Account created. Check your email to verify your address.".to_string(),
        user: UserPayload::from(&account),
    })
}

/// Consume the mailed token and mark the address verified.
#[utoipa::path(
    get,
    path = "/v1/auth/verify-email",
    params(
        ("token" = Option<String>, Query, description = "Verification token from the emailed link")
    ),
    responses(
        (status = 200, description = "Email verified", body = VerifyEmailResponse),
        (status = 400, description = "Missing, invalid or expired token", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn verify_email(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    params: Query<VerifyEmailParams>,
) -> impl IntoResponse {
    let token = match params.token.as_deref().map(str::trim) {
        Some(token) if !token.is_empty() => token.to_string(),
        _ => return AuthError::Validation("Verification token is required").into_response(),
    };

    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::VerifyEmail)
        == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    match confirm_email(&state, &token).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn confirm_email(state: &AuthState, token: &str) -> Result<VerifyEmailResponse, AuthError> {
    let mut account = state
        .lifecycle()
        .consume(TokenSlot::EmailVerification, token)
        .await?;

    account.verified = true;
    state
        .store()
        .save(&account)
        .await
        .map_err(AuthError::from)?;

    debug!(account_id = %account.id, "email verified");
    Ok(VerifyEmailResponse {
        message: "Email verified. You can now sign in.".to_string(),
    })
}
