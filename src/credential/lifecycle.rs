//! Issue and consume single-use opaque tokens.
//!
//! Every slot holds at most one live token. Issuing writes the digest and
//! expiry through the store before the raw token is returned, and consuming
//! clears the slot before the account is handed back, so a token that has
//! been accepted once can never be accepted again.

use std::sync::Arc;
use tracing::debug;

use super::account::{Account, TokenRecord, TokenSlot};
use super::error::AuthError;
use super::now_unix_seconds;
use super::secret::{generate_opaque_token, token_digest};
use super::store::UserStore;

#[derive(Clone)]
pub struct TokenLifecycle {
    store: Arc<dyn UserStore>,
}

impl TokenLifecycle {
    #[must_use]
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Mint a fresh token for the slot and persist its digest. Replaces any
    /// previous token in the slot, live or not. The returned string is the
    /// only copy of the raw secret.
    pub async fn issue(
        &self,
        account: &mut Account,
        slot: TokenSlot,
        ttl_seconds: i64,
    ) -> Result<String, AuthError> {
        let token = generate_opaque_token()?;
        let record = TokenRecord {
            digest: token_digest(&token),
            expires_at: now_unix_seconds() + ttl_seconds,
        };
        account.set_token_record(slot, record);
        self.store.save(account).await?;

        debug!(account_id = %account.id, slot = slot.as_str(), "issued token");

        Ok(token)
    }

    /// Redeem a presented token. Resolves the account by digest, rejecting
    /// expired or unknown tokens, then clears the slot and persists the
    /// cleared record before returning. Callers apply their flow's mutation
    /// (mark verified, swap password digest) and save again.
    pub async fn consume(&self, slot: TokenSlot, token: &str) -> Result<Account, AuthError> {
        let digest = token_digest(token);
        let account = self
            .store
            .find_by_token_digest(slot, &digest, now_unix_seconds())
            .await?;

        let Some(mut account) = account else {
            return Err(AuthError::TokenInvalidOrExpired);
        };

        account.clear_token_record(slot);
        self.store.save(&account).await?;

        debug!(account_id = %account.id, slot = slot.as_str(), "consumed token");

        Ok(account)
    }

    /// Drop whatever the slot holds. A no-op when the slot is already empty.
    pub async fn revoke(&self, account: &mut Account, slot: TokenSlot) -> Result<(), AuthError> {
        account.clear_token_record(slot);
        self.store.save(account).await?;

        debug!(account_id = %account.id, slot = slot.as_str(), "revoked token");

        Ok(())
    }
}
