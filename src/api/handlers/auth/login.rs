//! Password and federated login endpoints.

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
    rate_limited, LoginRequest, LoginResponse, OauthLoginRequest, OauthLoginResponse, UserPayload,
};
use crate::api::handlers::{extract_client_ip, normalize_email, valid_email};
use crate::credential::password::verify_password;
use crate::credential::{Account, AccountDraft, AuthError, Provider};

const DEFAULT_OAUTH_PROVIDER: &str = "google";

/// Password login. Returns an access token plus a rotating refresh token.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 400, description = "Missing payload or federated account", body = super::types::ErrorBody),
        (status = 401, description = "Incorrect password", body = super::types::ErrorBody),
        (status = 403, description = "Email not verified", body = super::types::ErrorBody),
        (status = 404, description = "Unknown email", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::Validation("Missing payload").into_response();
    };
    if request.email.is_empty() || request.password.is_empty() {
        return AuthError::Validation("Email and password are required").into_response();
    }

    let email = normalize_email(&request.email);
    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::Login)
        == RateLimitDecision::Limited
        || state.rate_limiter().check_email(&email, RateLimitAction::Login)
            == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    match password_login(&state, &email, &request.password, request.remember).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn password_login(
    state: &AuthState,
    email: &str,
    password: &str,
    remember: bool,
) -> Result<LoginResponse, AuthError> {
    let mut account = state
        .store()
        .find_by_email(email)
        .await
        .map_err(AuthError::from)?
        .ok_or(AuthError::NotFound)?;

    if !account.provider.is_local() {
        return Err(AuthError::ProviderMismatch(
            account.provider.as_str().to_string(),
        ));
    }
    let Some(digest) = account.password_digest.clone() else {
        return Err(AuthError::ProviderMismatch(
            account.provider.as_str().to_string(),
        ));
    };
    if !verify_password(password, &digest)? {
        return Err(AuthError::InvalidCredentials);
    }
    if !account.verified {
        return Err(AuthError::Unverified);
    }

    let access_token = state.sessions().issue_access(&account)?;
    let ttl = if remember {
        state.config().refresh_remember_ttl_seconds()
    } else {
        state.config().refresh_token_ttl_seconds()
    };
    let refresh_token = state.sessions().issue_refresh(&mut account, ttl).await?;

    info!(account_id = %account.id, remember, "login");
    Ok(LoginResponse {
        access_token,
        refresh_token,
        user: UserPayload::from(&account),
    })
}

/// Federated login. Upserts a verified account for the provider identity and
/// returns an access token only.
#[utoipa::path(
    post,
    path = "/v1/auth/oauth-login",
    request_body = OauthLoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = OauthLoginResponse),
        (status = 400, description = "Missing or invalid payload", body = super::types::ErrorBody),
        (status = 429, description = "Rate limited", body = super::types::ErrorBody),
        (status = 503, description = "Store unavailable", body = super::types::ErrorBody)
    ),
    tag = "auth"
)]
pub async fn oauth_login(
    headers: HeaderMap,
    state: Extension<Arc<AuthState>>,
    payload: Option<Json<OauthLoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return AuthError::Validation("Missing payload").into_response();
    };

    let email = normalize_email(&request.email);
    if !valid_email(&email) {
        return AuthError::Validation("A valid email is required").into_response();
    }

    let client_ip = extract_client_ip(&headers);
    if state
        .rate_limiter()
        .check_ip(client_ip.as_deref(), RateLimitAction::OauthLogin)
        == RateLimitDecision::Limited
    {
        return rate_limited();
    }

    let provider = request
        .provider
        .filter(|provider| !provider.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_OAUTH_PROVIDER.to_string());

    match federated_login(&state, email, request.name, provider).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn federated_login(
    state: &AuthState,
    email: String,
    name: Option<String>,
    provider: String,
) -> Result<OauthLoginResponse, AuthError> {
    let existing = state
        .store()
        .find_by_email(&email)
        .await
        .map_err(AuthError::from)?;

    let account: Account = match existing {
        Some(mut account) => {
            // The provider owns the mailbox, so federated sign-in both
            // verifies the address and takes over the provider column.
            account.provider = Provider::Federated(provider);
            account.verified = true;
            if account.name.is_none() {
                account.name = name;
            }
            state
                .store()
                .save(&account)
                .await
                .map_err(AuthError::from)?;
            account
        }
        None => state
            .store()
            .create(AccountDraft::federated(name, email, provider))
            .await
            .map_err(AuthError::from)?,
    };

    let access_token = state.sessions().issue_access(&account)?;
    info!(account_id = %account.id, provider = account.provider.as_str(), "federated login");
    Ok(OauthLoginResponse {
        access_token,
        user: UserPayload::from(&account),
    })
}
