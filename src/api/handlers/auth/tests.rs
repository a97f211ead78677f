//! Cross-flow auth tests over the in-memory store.

use super::login::login;
use super::password::{forgot_password, reset_password};
use super::register::{register, verify_email};
use super::session::{logout, refresh_token};
use super::types::{
    ForgotPasswordRequest, LoginRequest, LoginResponse, LogoutRequest, RefreshTokenRequest,
    RefreshTokenResponse, RegisterRequest, VerifyEmailParams,
};
use super::{AuthState, FixedWindowRateLimiter, NoopRateLimiter};
use crate::api::email::{EmailMessage, EmailSender};
use crate::credential::{AuthConfig, MemoryUserStore};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use axum::body::to_bytes;
use axum::extract::{Extension, Query};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use secrecy::SecretString;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Keeps every message a flow would have mailed, so tests can lift the raw
/// token out of the link exactly like a recipient would.
#[derive(Default)]
struct CapturingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl CapturingMailer {
    fn last_link_token(&self) -> Option<String> {
        let sent = self.sent.lock().ok()?;
        let message = sent.last()?;
        let tail = message.html.split("token=").nth(1)?;
        tail.split('"').next().map(ToString::to_string)
    }

    fn last_message(&self) -> Option<EmailMessage> {
        self.sent.lock().ok()?.last().cloned()
    }
}

#[async_trait]
impl EmailSender for CapturingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(message.clone());
        }
        Ok(())
    }
}

struct FailingMailer;

#[async_trait]
impl EmailSender for FailingMailer {
    async fn send(&self, _message: &EmailMessage) -> Result<()> {
        Err(anyhow!("mail provider down"))
    }
}

fn test_config() -> AuthConfig {
    AuthConfig::new(
        "https://app.example.com".to_string(),
        SecretString::from("test-signing-secret"),
    )
}

fn state_with_mailer(mailer: Arc<dyn EmailSender>) -> Arc<AuthState> {
    Arc::new(AuthState::new(
        test_config(),
        MemoryUserStore::shared(),
        mailer,
        Arc::new(NoopRateLimiter),
    ))
}

async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&bytes)?)
}

fn register_payload(email: &str, password: &str) -> Option<Json<RegisterRequest>> {
    Some(Json(RegisterRequest {
        name: Some("Ada".to_string()),
        email: email.to_string(),
        password: password.to_string(),
    }))
}

fn login_payload(email: &str, password: &str) -> Option<Json<LoginRequest>> {
    Some(Json(LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
        remember: false,
    }))
}

#[tokio::test]
async fn register_verify_login_refresh_logout_roundtrip() -> Result<()> {
    let mailer = Arc::new(CapturingMailer::default());
    let state = state_with_mailer(mailer.clone());

    let response = register(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        register_payload("ada@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::CREATED);

    // The mailed link points at the configured frontend.
    let message = mailer.last_message().context("no mail sent")?;
    assert_eq!(message.to_email, "ada@example.com");
    assert!(message
        .html
        .contains("https://app.example.com/auth/verify-email?token="));
    let token = mailer.last_link_token().context("no token in link")?;

    let response = verify_email(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Query(VerifyEmailParams { token: Some(token) }),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let response = login(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        login_payload("ada@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let session: LoginResponse = body_json(response).await?;

    let response = refresh_token(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Some(Json(RefreshTokenRequest {
            refresh_token: session.refresh_token.clone(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated: RefreshTokenResponse = body_json(response).await?;
    assert_ne!(rotated.refresh_token, session.refresh_token);

    let response = logout(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Some(Json(LogoutRequest {
            refresh_token: Some(rotated.refresh_token.clone()),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    // Nothing left to rotate after logout.
    let response = refresh_token(
        HeaderMap::new(),
        Extension(state),
        Some(Json(RefreshTokenRequest {
            refresh_token: rotated.refresh_token,
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn login_is_blocked_until_the_email_is_verified() -> Result<()> {
    let mailer = Arc::new(CapturingMailer::default());
    let state = state_with_mailer(mailer.clone());

    register(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        register_payload("ada@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();

    let response = login(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        login_payload("ada@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = mailer.last_link_token().context("no token in link")?;
    verify_email(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Query(VerifyEmailParams { token: Some(token) }),
    )
    .await
    .into_response();

    let response = login(
        HeaderMap::new(),
        Extension(state),
        login_payload("ada@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn password_reset_flow_replaces_the_password() -> Result<()> {
    let mailer = Arc::new(CapturingMailer::default());
    let state = state_with_mailer(mailer.clone());

    register(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        register_payload("ada@example.com", "old-password"),
    )
    .await
    .into_response();
    let token = mailer.last_link_token().context("no token in link")?;
    verify_email(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Query(VerifyEmailParams { token: Some(token) }),
    )
    .await
    .into_response();

    let response = forgot_password(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Some(Json(ForgotPasswordRequest {
            email: "ada@example.com".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let message = mailer.last_message().context("no mail sent")?;
    assert!(message
        .html
        .contains("https://app.example.com/auth/reset-password?token="));
    let reset = mailer.last_link_token().context("no token in link")?;

    let response = reset_password(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        Some(Json(super::types::ResetPasswordRequest {
            token: reset,
            new_password: "new-password".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::OK);

    let old = login(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        login_payload("ada@example.com", "old-password"),
    )
    .await
    .into_response();
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = login(
        HeaderMap::new(),
        Extension(state),
        login_payload("ada@example.com", "new-password"),
    )
    .await
    .into_response();
    assert_eq!(new.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn mail_failure_reports_upstream_but_keeps_the_account() -> Result<()> {
    let state = state_with_mailer(Arc::new(FailingMailer));

    let response = register(
        HeaderMap::new(),
        Extension(Arc::clone(&state)),
        register_payload("ada@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    // The body hides the provider failure behind a generic message.
    let body: serde_json::Value = body_json(response).await?;
    assert_eq!(body["error"], "upstream");
    assert_eq!(body["message"], "service temporarily unavailable");

    // The account exists even though the mail never left.
    let stored = state.store().find_by_email("ada@example.com").await?;
    assert!(stored.is_some());

    let response = forgot_password(
        HeaderMap::new(),
        Extension(state),
        Some(Json(ForgotPasswordRequest {
            email: "ada@example.com".to_string(),
        })),
    )
    .await
    .into_response();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    Ok(())
}

#[tokio::test]
async fn one_ip_window_covers_all_auth_routes() -> Result<()> {
    let state = Arc::new(AuthState::new(
        test_config(),
        MemoryUserStore::shared(),
        Arc::new(CapturingMailer::default()),
        Arc::new(FixedWindowRateLimiter::new(2, Duration::from_secs(60))),
    ));
    let mut headers = HeaderMap::new();
    headers.insert("x-forwarded-for", HeaderValue::from_static("9.9.9.9"));

    let first = register(
        headers.clone(),
        Extension(Arc::clone(&state)),
        register_payload("one@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = register(
        headers.clone(),
        Extension(Arc::clone(&state)),
        register_payload("two@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(second.status(), StatusCode::CREATED);

    // Third request from the same IP hits the shared window, even on a
    // different route.
    let third = verify_email(
        headers.clone(),
        Extension(Arc::clone(&state)),
        Query(VerifyEmailParams {
            token: Some("whatever".to_string()),
        }),
    )
    .await
    .into_response();
    assert_eq!(third.status(), StatusCode::TOO_MANY_REQUESTS);

    // A different IP is unaffected.
    let mut other = HeaderMap::new();
    other.insert("x-forwarded-for", HeaderValue::from_static("8.8.8.8"));
    let fresh = register(
        other,
        Extension(state),
        register_payload("three@example.com", "hunter2hunter2"),
    )
    .await
    .into_response();
    assert_eq!(fresh.status(), StatusCode::CREATED);
    Ok(())
}
