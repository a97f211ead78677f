//! Credential store trait and the in-memory backend.
//!
//! The store owns account persistence; callers hand it normalized emails and
//! token digests, never raw secrets. `save` is a full-record replace with
//! last-writer-wins semantics, so all slot mutations land in one write.

pub mod postgres;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::account::{Account, AccountDraft, TokenSlot};
use super::error::StoreError;
use super::now_unix_seconds;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Look up by normalized email.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Resolve an account id, used by the access guard.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError>;

    /// Look up by slot digest, filtered to expiry strictly greater than
    /// `now`. An expired token never resolves, even when its digest matches.
    async fn find_by_token_digest(
        &self,
        slot: TokenSlot,
        digest: &[u8],
        now: i64,
    ) -> Result<Option<Account>, StoreError>;

    /// Create an account, assigning id and creation time. Fails with
    /// [`StoreError::DuplicateEmail`] when the email is taken, including
    /// under concurrent inserts.
    async fn create(&self, draft: AccountDraft) -> Result<Account, StoreError>;

    /// Persist the full record; the last writer wins.
    async fn save(&self, account: &Account) -> Result<(), StoreError>;

    /// All accounts, newest first.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    /// Liveness probe for the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// In-process store for local development (`--dsn memory`) and tests.
/// Honors the same contract as the Postgres backend.
#[derive(Default)]
pub struct MemoryUserStore {
    accounts: RwLock<HashMap<Uuid, Account>>,
}

impl MemoryUserStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Convenience for handler wiring.
    #[must_use]
    pub fn shared() -> Arc<dyn UserStore> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&id).cloned())
    }

    async fn find_by_token_digest(
        &self,
        slot: TokenSlot,
        digest: &[u8],
        now: i64,
    ) -> Result<Option<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        Ok(accounts
            .values()
            .find(|account| {
                account
                    .token_record(slot)
                    .is_some_and(|record| record.digest == digest && record.is_live(now))
            })
            .cloned())
    }

    async fn create(&self, draft: AccountDraft) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.values().any(|a| a.email == draft.email) {
            return Err(StoreError::DuplicateEmail);
        }
        let account = Account::from_draft(Uuid::new_v4(), now_unix_seconds(), draft);
        accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        accounts.insert(account.id, account.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        let mut list: Vec<Account> = accounts.values().cloned().collect();
        list.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.email.cmp(&b.email))
        });
        Ok(list)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
