//! Access and refresh session tokens.
//!
//! Access tokens are stateless HS256 JWTs verified by signature and expiry
//! alone; they are never stored. Refresh tokens are opaque single-use
//! secrets held in the refresh slot, so presenting one rotates it.

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::account::{Account, TokenSlot};
use super::config::AuthConfig;
use super::error::AuthError;
use super::lifecycle::TokenLifecycle;
use super::now_unix_seconds;

/// The pair handed out on login and on every refresh rotation.
#[derive(Debug, Serialize)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct SessionIssuer {
    lifecycle: TokenLifecycle,
    config: AuthConfig,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(lifecycle: TokenLifecycle, config: AuthConfig) -> Self {
        Self { lifecycle, config }
    }

    /// Sign a short-lived access token for the account.
    pub fn issue_access(&self, account: &Account) -> Result<String, AuthError> {
        let now = now_unix_seconds();
        let claims = AccessClaims {
            sub: account.id,
            email: account.email.clone(),
            role: account.role.as_str().to_string(),
            iat: now,
            exp: now + self.config.access_token_ttl_seconds(),
        };

        let key = EncodingKey::from_secret(self.config.signing_secret().as_bytes());
        encode(&Header::default(), &claims, &key).map_err(|err| {
            AuthError::Upstream(anyhow::anyhow!("failed to sign access token: {err}"))
        })
    }

    /// Check signature and expiry. Any defect collapses to
    /// [`AuthError::Unauthorized`] so callers cannot leak why a token failed.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let key = DecodingKey::from_secret(self.config.signing_secret().as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        decode::<AccessClaims>(token, &key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::Unauthorized)
    }

    /// Mint an opaque refresh token, replacing any live one.
    pub async fn issue_refresh(
        &self,
        account: &mut Account,
        ttl_seconds: i64,
    ) -> Result<String, AuthError> {
        self.lifecycle
            .issue(account, TokenSlot::Refresh, ttl_seconds)
            .await
    }

    /// Redeem a refresh token for a fresh session pair. The presented token
    /// is retired before the replacement exists, so it cannot be replayed
    /// even if rotation fails midway.
    pub async fn rotate_refresh(&self, presented: &str) -> Result<SessionTokens, AuthError> {
        let mut account = self.lifecycle.consume(TokenSlot::Refresh, presented).await?;

        let access = self.issue_access(&account)?;
        let refresh = self
            .issue_refresh(&mut account, self.config.refresh_token_ttl_seconds())
            .await?;

        Ok(SessionTokens { access, refresh })
    }

    /// Retire a refresh token on logout. Unknown or already-retired tokens
    /// are treated as success, so logout is idempotent.
    pub async fn revoke_refresh(&self, presented: &str) -> Result<(), AuthError> {
        match self.lifecycle.consume(TokenSlot::Refresh, presented).await {
            Ok(_) | Err(AuthError::TokenInvalidOrExpired) => Ok(()),
            Err(err) => Err(err),
        }
    }
}
