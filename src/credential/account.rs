//! Account records and their stored token slots.

use std::fmt;
use uuid::Uuid;

/// Stored token classes. The access token is signed and never stored, so it
/// has no slot here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenSlot {
    EmailVerification,
    PasswordReset,
    Refresh,
}

impl TokenSlot {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::EmailVerification => "email_verification",
            Self::PasswordReset => "password_reset",
            Self::Refresh => "refresh",
        }
    }
}

/// A live stored token: digest plus expiry, always set and cleared together.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenRecord {
    pub digest: Vec<u8>,
    pub expires_at: i64,
}

impl TokenRecord {
    #[must_use]
    pub fn is_live(&self, now: i64) -> bool {
        self.expires_at > now
    }
}

impl fmt::Debug for TokenRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Digests are not raw secrets, but they still never belong in logs.
        f.debug_struct("TokenRecord")
            .field("digest", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Authorization tier. New accounts start as `User`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }

    /// Parse a stored role string; unknown values fall back to `User`.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => Self::Admin,
            _ => Self::User,
        }
    }
}

/// How the account authenticates: a local password or a federated identity
/// provider. Federated accounts never go through password verification.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Provider {
    Local,
    Federated(String),
}

impl Provider {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Local => "local",
            Self::Federated(name) => name,
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "local" {
            Self::Local
        } else {
            Self::Federated(value.to_string())
        }
    }

    #[must_use]
    pub const fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Input for [`store::UserStore::create`]. The store assigns `id` and
/// `created_at`.
///
/// [`store::UserStore::create`]: crate::credential::store::UserStore::create
#[derive(Clone, Debug)]
pub struct AccountDraft {
    pub name: Option<String>,
    pub email: String,
    pub password_digest: Option<String>,
    pub verified: bool,
    pub role: Role,
    pub provider: Provider,
}

impl AccountDraft {
    /// Draft for a local registration: unverified until the email link is
    /// consumed.
    #[must_use]
    pub fn local(name: Option<String>, email: String, password_digest: String) -> Self {
        Self {
            name,
            email,
            password_digest: Some(password_digest),
            verified: false,
            role: Role::User,
            provider: Provider::Local,
        }
    }

    /// Draft for a first federated sign-in: no password, verified from the
    /// start since the provider already owns the mailbox.
    #[must_use]
    pub fn federated(name: Option<String>, email: String, provider: String) -> Self {
        Self {
            name,
            email,
            password_digest: None,
            verified: true,
            role: Role::User,
            provider: Provider::Federated(provider),
        }
    }
}

/// One registered principal. Emails are normalized to lowercase before they
/// reach this type; the three token slots hold at most one live token each.
#[derive(Clone)]
pub struct Account {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub password_digest: Option<String>,
    pub verified: bool,
    pub role: Role,
    pub provider: Provider,
    pub created_at: i64,
    pub email_verification: Option<TokenRecord>,
    pub password_reset: Option<TokenRecord>,
    pub refresh: Option<TokenRecord>,
}

impl Account {
    /// Materialize a draft once the store has assigned identity and creation
    /// time. All token slots start empty.
    #[must_use]
    pub fn from_draft(id: Uuid, created_at: i64, draft: AccountDraft) -> Self {
        Self {
            id,
            name: draft.name,
            email: draft.email,
            password_digest: draft.password_digest,
            verified: draft.verified,
            role: draft.role,
            provider: draft.provider,
            created_at,
            email_verification: None,
            password_reset: None,
            refresh: None,
        }
    }

    #[must_use]
    pub fn token_record(&self, slot: TokenSlot) -> Option<&TokenRecord> {
        match slot {
            TokenSlot::EmailVerification => self.email_verification.as_ref(),
            TokenSlot::PasswordReset => self.password_reset.as_ref(),
            TokenSlot::Refresh => self.refresh.as_ref(),
        }
    }

    /// Overwrite the slot with a fresh record, invalidating any prior token.
    pub fn set_token_record(&mut self, slot: TokenSlot, record: TokenRecord) {
        *self.slot_mut(slot) = Some(record);
    }

    /// Clear digest and expiry together; a half-cleared slot is never valid.
    pub fn clear_token_record(&mut self, slot: TokenSlot) {
        *self.slot_mut(slot) = None;
    }

    fn slot_mut(&mut self, slot: TokenSlot) -> &mut Option<TokenRecord> {
        match slot {
            TokenSlot::EmailVerification => &mut self.email_verification,
            TokenSlot::PasswordReset => &mut self.password_reset,
            TokenSlot::Refresh => &mut self.refresh,
        }
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field(
                "password_digest",
                &self.password_digest.as_ref().map(|_| "***"),
            )
            .field("verified", &self.verified)
            .field("role", &self.role)
            .field("provider", &self.provider)
            .field("created_at", &self.created_at)
            .field("email_verification", &self.email_verification)
            .field("password_reset", &self.password_reset)
            .field("refresh", &self.refresh)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account() -> Account {
        Account::from_draft(
            Uuid::new_v4(),
            1_700_000_000,
            AccountDraft::local(
                Some("Alice".to_string()),
                "alice@example.com".to_string(),
                "$argon2id$dummy".to_string(),
            ),
        )
    }

    #[test]
    fn local_draft_starts_unverified() {
        let draft = AccountDraft::local(None, "a@example.com".to_string(), "digest".to_string());
        assert!(!draft.verified);
        assert_eq!(draft.role, Role::User);
        assert!(draft.provider.is_local());
    }

    #[test]
    fn federated_draft_is_verified_without_password() {
        let draft =
            AccountDraft::federated(None, "a@example.com".to_string(), "google".to_string());
        assert!(draft.verified);
        assert!(draft.password_digest.is_none());
        assert_eq!(draft.provider.as_str(), "google");
    }

    #[test]
    fn slots_set_and_clear_as_a_pair() {
        let mut account = account();
        assert!(account.token_record(TokenSlot::PasswordReset).is_none());

        account.set_token_record(
            TokenSlot::PasswordReset,
            TokenRecord {
                digest: vec![1, 2, 3],
                expires_at: 1_700_000_060,
            },
        );
        let record = account.token_record(TokenSlot::PasswordReset);
        assert!(record.is_some_and(|r| r.expires_at == 1_700_000_060));
        // Other slots are untouched.
        assert!(account.token_record(TokenSlot::Refresh).is_none());

        account.clear_token_record(TokenSlot::PasswordReset);
        assert!(account.token_record(TokenSlot::PasswordReset).is_none());
    }

    #[test]
    fn token_record_liveness_is_strict() {
        let record = TokenRecord {
            digest: vec![0],
            expires_at: 100,
        };
        assert!(record.is_live(99));
        assert!(!record.is_live(100));
        assert!(!record.is_live(101));
    }

    #[test]
    fn debug_never_prints_credential_material() {
        let mut account = account();
        account.set_token_record(
            TokenSlot::Refresh,
            TokenRecord {
                digest: vec![0xAB; 32],
                expires_at: 1_700_000_060,
            },
        );
        let rendered = format!("{account:?}");
        assert!(rendered.contains("***"));
        assert!(!rendered.contains("argon2id"));
        assert!(!rendered.contains("[171")); // digest bytes (0xAB) as a Vec debug
    }

    #[test]
    fn role_and_provider_round_trip() {
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("something-else"), Role::User);
        assert_eq!(Provider::parse("local"), Provider::Local);
        assert_eq!(
            Provider::parse("google"),
            Provider::Federated("google".to_string())
        );
    }
}
