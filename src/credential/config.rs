//! Auth configuration: expiry windows, signing secret, frontend base URL.
//!
//! Injected into [`TokenLifecycle`] callers and [`SessionIssuer`] at
//! construction; nothing reads ambient/global state.
//!
//! [`TokenLifecycle`]: crate::credential::TokenLifecycle
//! [`SessionIssuer`]: crate::credential::SessionIssuer

use secrecy::{ExposeSecret, SecretString};

const DEFAULT_ACCESS_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_VERIFY_TOKEN_TTL_SECONDS: i64 = 60 * 60;
const DEFAULT_RESET_TOKEN_TTL_SECONDS: i64 = 15 * 60;
const DEFAULT_REFRESH_TOKEN_TTL_SECONDS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_REFRESH_REMEMBER_TTL_SECONDS: i64 = 30 * 24 * 60 * 60;

#[derive(Clone, Debug)]
pub struct AuthConfig {
    frontend_base_url: String,
    signing_secret: SecretString,
    access_token_ttl_seconds: i64,
    verify_token_ttl_seconds: i64,
    reset_token_ttl_seconds: i64,
    refresh_token_ttl_seconds: i64,
    refresh_remember_ttl_seconds: i64,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String, signing_secret: SecretString) -> Self {
        Self {
            frontend_base_url,
            signing_secret,
            access_token_ttl_seconds: DEFAULT_ACCESS_TOKEN_TTL_SECONDS,
            verify_token_ttl_seconds: DEFAULT_VERIFY_TOKEN_TTL_SECONDS,
            reset_token_ttl_seconds: DEFAULT_RESET_TOKEN_TTL_SECONDS,
            refresh_token_ttl_seconds: DEFAULT_REFRESH_TOKEN_TTL_SECONDS,
            refresh_remember_ttl_seconds: DEFAULT_REFRESH_REMEMBER_TTL_SECONDS,
        }
    }

    #[must_use]
    pub fn with_access_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.access_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_verify_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.verify_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_reset_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.reset_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_token_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_token_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn with_refresh_remember_ttl_seconds(mut self, seconds: i64) -> Self {
        self.refresh_remember_ttl_seconds = seconds;
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    pub(crate) fn signing_secret(&self) -> &str {
        self.signing_secret.expose_secret()
    }

    #[must_use]
    pub fn access_token_ttl_seconds(&self) -> i64 {
        self.access_token_ttl_seconds
    }

    #[must_use]
    pub fn verify_token_ttl_seconds(&self) -> i64 {
        self.verify_token_ttl_seconds
    }

    #[must_use]
    pub fn reset_token_ttl_seconds(&self) -> i64 {
        self.reset_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_token_ttl_seconds(&self) -> i64 {
        self.refresh_token_ttl_seconds
    }

    #[must_use]
    pub fn refresh_remember_ttl_seconds(&self) -> i64 {
        self.refresh_remember_ttl_seconds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig::new(
            "https://app.example.com".to_string(),
            SecretString::from("test-signing-secret"),
        )
    }

    #[test]
    fn defaults_match_design_windows() {
        let config = config();
        assert_eq!(config.access_token_ttl_seconds(), 3600);
        assert_eq!(config.verify_token_ttl_seconds(), 3600);
        assert_eq!(config.reset_token_ttl_seconds(), 900);
        assert_eq!(config.refresh_token_ttl_seconds(), 7 * 86_400);
        assert_eq!(config.refresh_remember_ttl_seconds(), 30 * 86_400);
    }

    #[test]
    fn builders_override_defaults() {
        let config = config()
            .with_access_token_ttl_seconds(60)
            .with_verify_token_ttl_seconds(120)
            .with_reset_token_ttl_seconds(30)
            .with_refresh_token_ttl_seconds(600)
            .with_refresh_remember_ttl_seconds(1200);
        assert_eq!(config.access_token_ttl_seconds(), 60);
        assert_eq!(config.verify_token_ttl_seconds(), 120);
        assert_eq!(config.reset_token_ttl_seconds(), 30);
        assert_eq!(config.refresh_token_ttl_seconds(), 600);
        assert_eq!(config.refresh_remember_ttl_seconds(), 1200);
    }

    #[test]
    fn debug_redacts_the_signing_secret() {
        let rendered = format!("{:?}", config());
        assert!(!rendered.contains("test-signing-secret"));
    }
}
