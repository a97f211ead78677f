//! Error taxonomy for credential operations.
//!
//! Every failure a caller can observe maps to one of these kinds; the HTTP
//! layer turns them into status codes and `{ error, message }` bodies.
//! Messages never carry raw tokens or password digests.

use thiserror::Error;

/// Credential store failures.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The normalized email already belongs to an account.
    #[error("email already registered")]
    DuplicateEmail,
    /// The backend is unreachable or returned an unexpected failure.
    #[error("credential store unavailable: {0}")]
    Unavailable(#[from] anyhow::Error),
}

/// Caller-visible outcomes for every auth operation.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Missing or malformed input; the message is safe to echo.
    #[error("{0}")]
    Validation(&'static str),
    #[error("email already registered")]
    DuplicateEmail,
    #[error("no account matches that email")]
    NotFound,
    #[error("incorrect email or password")]
    InvalidCredentials,
    #[error("email address is not verified")]
    Unverified,
    /// Covers all three stored token classes; callers cannot distinguish a
    /// wrong token from an expired one.
    #[error("token is invalid or expired")]
    TokenInvalidOrExpired,
    /// Password login attempted against a federated account.
    #[error("please sign in using {0}")]
    ProviderMismatch(String),
    #[error("missing or invalid access token")]
    Unauthorized,
    /// Store or mail collaborator failed; detail stays in server logs.
    #[error("upstream dependency failed: {0}")]
    Upstream(#[source] anyhow::Error),
}

impl AuthError {
    /// Stable symbolic kind serialized in error responses.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::DuplicateEmail => "duplicate_email",
            Self::NotFound => "not_found",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Unverified => "unverified",
            Self::TokenInvalidOrExpired => "token_invalid_or_expired",
            Self::ProviderMismatch(_) => "provider_mismatch",
            Self::Unauthorized => "unauthorized",
            Self::Upstream(_) => "upstream",
        }
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Upstream(err)
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::Unavailable(inner) => Self::Upstream(inner),
        }
    }
}
