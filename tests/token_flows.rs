//! Integration tests over the public credential API.
//!
//! These drive the same sequences the HTTP handlers do, but through the
//! library surface only: an in-memory store, a `TokenLifecycle`, and a
//! `SessionIssuer` built from an explicit `AuthConfig`. No server, no
//! database.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use atesti::credential::password::{hash_password, verify_password};
use atesti::credential::secret::token_digest;
use atesti::credential::{
    Account, AccountDraft, AuthConfig, AuthError, MemoryUserStore, SessionIssuer, StoreError,
    TokenLifecycle, TokenSlot, UserStore,
};
use secrecy::SecretString;

fn config() -> AuthConfig {
    AuthConfig::new(
        "https://app.example.com".to_string(),
        SecretString::from("integration-signing-secret"),
    )
}

fn now_seconds() -> i64 {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before epoch");
    i64::try_from(elapsed.as_secs()).expect("epoch seconds fit i64")
}

async fn local_account(store: &Arc<dyn UserStore>, email: &str, password: &str) -> Account {
    let digest = hash_password(password).expect("hash");
    store
        .create(AccountDraft::local(None, email.to_string(), digest))
        .await
        .expect("create")
}

#[tokio::test]
async fn registration_to_session_flow() {
    let store: Arc<dyn UserStore> = MemoryUserStore::shared();
    let lifecycle = TokenLifecycle::new(Arc::clone(&store));
    let sessions = SessionIssuer::new(lifecycle.clone(), config());

    let mut account = local_account(&store, "dana@example.com", "correct horse").await;
    assert!(!account.verified);

    // The raw verification token exists only in this variable, as in the
    // mailed link.
    let mailed = lifecycle
        .issue(&mut account, TokenSlot::EmailVerification, 3600)
        .await
        .expect("issue");

    let mut verified = lifecycle
        .consume(TokenSlot::EmailVerification, &mailed)
        .await
        .expect("consume");
    verified.verified = true;
    store.save(&verified).await.expect("save");

    // Password check then session issuance, the way login does it.
    let mut stored = store
        .find_by_email("dana@example.com")
        .await
        .expect("lookup")
        .expect("account");
    assert!(stored.verified);
    let digest = stored.password_digest.clone().expect("password digest");
    assert_eq!(verify_password("correct horse", &digest).ok(), Some(true));
    assert_eq!(verify_password("wrong horse", &digest).ok(), Some(false));

    let access = sessions.issue_access(&stored).expect("access");
    let refresh = sessions
        .issue_refresh(&mut stored, 7 * 86_400)
        .await
        .expect("refresh");

    let claims = sessions.verify_access(&access).expect("claims");
    assert_eq!(claims.sub, stored.id);
    assert_eq!(claims.email, "dana@example.com");
    assert_eq!(claims.exp - claims.iat, 3600);

    // Rotation retires the presented token and mints a working pair.
    let pair = sessions.rotate_refresh(&refresh).await.expect("rotate");
    assert!(matches!(
        sessions.rotate_refresh(&refresh).await.unwrap_err(),
        AuthError::TokenInvalidOrExpired
    ));
    sessions
        .rotate_refresh(&pair.refresh)
        .await
        .expect("rotate replacement");
}

#[tokio::test]
async fn password_reset_window_and_single_use() {
    let store: Arc<dyn UserStore> = MemoryUserStore::shared();
    let lifecycle = TokenLifecycle::new(Arc::clone(&store));

    let mut account = local_account(&store, "erin@example.com", "old password").await;
    let before = now_seconds();
    let token = lifecycle
        .issue(&mut account, TokenSlot::PasswordReset, 900)
        .await
        .expect("issue");

    let record = account
        .token_record(TokenSlot::PasswordReset)
        .expect("reset record");
    assert!(record.expires_at >= before + 900);
    assert!(record.expires_at <= now_seconds() + 900);

    // Consume, then swap the digest the way reset-password does.
    let mut consumed = lifecycle
        .consume(TokenSlot::PasswordReset, &token)
        .await
        .expect("consume");
    consumed.password_digest = Some(hash_password("new password").expect("hash"));
    store.save(&consumed).await.expect("save");

    let stored = store
        .find_by_id(account.id)
        .await
        .expect("lookup")
        .expect("account");
    let digest = stored.password_digest.expect("password digest");
    assert_eq!(verify_password("new password", &digest).ok(), Some(true));
    assert_eq!(verify_password("old password", &digest).ok(), Some(false));

    // Replay of the consumed token.
    assert!(matches!(
        lifecycle
            .consume(TokenSlot::PasswordReset, &token)
            .await
            .unwrap_err(),
        AuthError::TokenInvalidOrExpired
    ));
}

#[tokio::test]
async fn zero_ttl_token_never_redeems() {
    let store: Arc<dyn UserStore> = MemoryUserStore::shared();
    let lifecycle = TokenLifecycle::new(Arc::clone(&store));
    let mut account = local_account(&store, "eve@example.com", "pw").await;

    // The expiry filter is strict, so a token expiring "now" is already dead.
    let token = lifecycle
        .issue(&mut account, TokenSlot::EmailVerification, 0)
        .await
        .expect("issue");

    assert!(matches!(
        lifecycle
            .consume(TokenSlot::EmailVerification, &token)
            .await
            .unwrap_err(),
        AuthError::TokenInvalidOrExpired
    ));
}

#[tokio::test]
async fn reissue_retires_the_earlier_token_but_not_other_slots() {
    let store: Arc<dyn UserStore> = MemoryUserStore::shared();
    let lifecycle = TokenLifecycle::new(Arc::clone(&store));
    let mut account = local_account(&store, "finn@example.com", "pw").await;

    let verify_token = lifecycle
        .issue(&mut account, TokenSlot::EmailVerification, 3600)
        .await
        .expect("issue");
    let first_reset = lifecycle
        .issue(&mut account, TokenSlot::PasswordReset, 900)
        .await
        .expect("issue");
    let second_reset = lifecycle
        .issue(&mut account, TokenSlot::PasswordReset, 900)
        .await
        .expect("issue");

    // The replaced reset token is gone; its replacement redeems.
    assert!(matches!(
        lifecycle
            .consume(TokenSlot::PasswordReset, &first_reset)
            .await
            .unwrap_err(),
        AuthError::TokenInvalidOrExpired
    ));
    lifecycle
        .consume(TokenSlot::PasswordReset, &second_reset)
        .await
        .expect("consume");

    // The verification slot was untouched throughout.
    lifecycle
        .consume(TokenSlot::EmailVerification, &verify_token)
        .await
        .expect("consume");
}

#[tokio::test]
async fn duplicate_email_is_rejected_by_the_store() {
    let store: Arc<dyn UserStore> = MemoryUserStore::shared();
    local_account(&store, "gale@example.com", "pw").await;

    let err = store
        .create(AccountDraft::local(
            None,
            "gale@example.com".to_string(),
            hash_password("other").expect("hash"),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::DuplicateEmail));
}

#[tokio::test]
async fn federated_accounts_carry_no_password_material() {
    let store: Arc<dyn UserStore> = MemoryUserStore::shared();
    let account = store
        .create(AccountDraft::federated(
            Some("Hana".to_string()),
            "hana@example.com".to_string(),
            "google".to_string(),
        ))
        .await
        .expect("create");

    assert!(account.verified);
    assert!(!account.provider.is_local());
    assert_eq!(account.provider.as_str(), "google");
    assert!(account.password_digest.is_none());
}

#[test]
fn token_digest_is_deterministic_and_exact() {
    let digest = token_digest("an-opaque-token");
    assert_eq!(digest, token_digest("an-opaque-token"));
    assert_ne!(digest, token_digest("an-opaque-tokeN"));
    // SHA-256 output.
    assert_eq!(digest.len(), 32);
}
