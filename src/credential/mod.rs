//! Token lifecycle and account credential state.
//!
//! Everything that touches credential material lives here: account records
//! with their stored token slots, opaque token generation and digests,
//! password hashing, the single-use token state machine, and session
//! (access/refresh) issuance. Raw tokens are returned exactly once to the
//! issuing caller; only SHA-256 digests are persisted, so a store compromise
//! never discloses a usable token.
//!
//! Handlers talk to this module through [`TokenLifecycle`], [`SessionIssuer`],
//! and the [`store::UserStore`] trait. Nothing in here knows about HTTP.

pub mod account;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod password;
pub mod secret;
pub mod session;
pub mod store;

pub use account::{Account, AccountDraft, Provider, Role, TokenRecord, TokenSlot};
pub use config::AuthConfig;
pub use error::{AuthError, StoreError};
pub use lifecycle::TokenLifecycle;
pub use session::{AccessClaims, SessionIssuer, SessionTokens};
pub use store::{MemoryUserStore, UserStore};

use std::time::SystemTime;

/// Unix seconds used for token expiry math and `iat`/`exp` claims.
pub(crate) fn now_unix_seconds() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::now_unix_seconds;

    #[test]
    fn now_unix_seconds_is_recent() {
        // 2024-01-01T00:00:00Z as a floor; catches a zeroed clock fallback.
        assert!(now_unix_seconds() > 1_704_067_200);
    }
}
