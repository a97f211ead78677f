//! Request/response types for auth endpoints, and the error mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::ToSchema;

use crate::credential::{Account, AuthError};

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterResponse {
    pub message: String,
    pub user: UserPayload,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailParams {
    pub token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct VerifyEmailResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember: bool,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserPayload,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OauthLoginRequest {
    pub email: String,
    pub name: Option<String>,
    pub provider: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct OauthLoginResponse {
    pub access_token: String,
    pub user: UserPayload,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ForgotPasswordResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResetPasswordResponse {
    pub message: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutRequest {
    pub refresh_token: Option<String>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogoutResponse {
    pub message: String,
}

/// Public account view. Never carries password digests or token material.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserPayload {
    pub id: String,
    pub name: Option<String>,
    pub email: String,
    pub verified: bool,
    pub role: String,
    pub provider: String,
    pub created_at: i64,
}

impl From<&Account> for UserPayload {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            verified: account.verified,
            role: account.role.as_str().to_string(),
            provider: account.provider.as_str().to_string(),
            created_at: account.created_at,
        }
    }
}

/// Error envelope carried by every non-2xx auth response.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::TokenInvalidOrExpired | Self::ProviderMismatch(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Unverified => StatusCode::FORBIDDEN,
            Self::Upstream(err) => {
                // The cause goes to the log; the response body stays generic.
                error!("upstream dependency failed: {err}");
                return (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(ErrorBody {
                        error: self.kind().to_string(),
                        message: "service temporarily unavailable".to_string(),
                    }),
                )
                    .into_response();
            }
        };

        let body = ErrorBody {
            error: self.kind().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// 429 envelope returned by every rate-limited route.
pub(crate) fn rate_limited() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(ErrorBody {
            error: "rate_limited".to_string(),
            message: "too many requests, please retry later".to_string(),
        }),
    )
        .into_response()
}
