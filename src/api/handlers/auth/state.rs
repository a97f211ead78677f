//! Shared state handed to every auth handler.

use crate::api::email::EmailSender;
use crate::api::handlers::auth::rate_limit::RateLimiter;
use crate::credential::{AuthConfig, SessionIssuer, TokenLifecycle, UserStore};
use std::sync::Arc;

/// Bundles the store, token machinery and outbound mailer behind one
/// `Extension` so handlers stay plain functions.
pub struct AuthState {
    config: AuthConfig,
    store: Arc<dyn UserStore>,
    lifecycle: TokenLifecycle,
    sessions: SessionIssuer,
    mailer: Arc<dyn EmailSender>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl AuthState {
    #[must_use]
    pub fn new(
        config: AuthConfig,
        store: Arc<dyn UserStore>,
        mailer: Arc<dyn EmailSender>,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        let lifecycle = TokenLifecycle::new(Arc::clone(&store));
        let sessions = SessionIssuer::new(lifecycle.clone(), config.clone());
        Self {
            config,
            store,
            lifecycle,
            sessions,
            mailer,
            rate_limiter,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn UserStore> {
        &self.store
    }

    pub fn lifecycle(&self) -> &TokenLifecycle {
        &self.lifecycle
    }

    pub fn sessions(&self) -> &SessionIssuer {
        &self.sessions
    }

    pub fn mailer(&self) -> &Arc<dyn EmailSender> {
        &self.mailer
    }

    pub(crate) fn rate_limiter(&self) -> &Arc<dyn RateLimiter> {
        &self.rate_limiter
    }
}

#[cfg(test)]
impl AuthState {
    /// Memory-backed state with the noop limiter and log mailer.
    pub(crate) fn for_tests() -> Arc<Self> {
        use crate::api::email::LogEmailSender;
        use crate::api::handlers::auth::rate_limit::NoopRateLimiter;
        use crate::credential::store::MemoryUserStore;
        use secrecy::SecretString;

        let config = AuthConfig::new(
            "https://app.example.com".to_string(),
            SecretString::from("test-signing-secret"),
        );
        Arc::new(Self::new(
            config,
            MemoryUserStore::shared(),
            Arc::new(LogEmailSender),
            Arc::new(NoopRateLimiter),
        ))
    }
}
