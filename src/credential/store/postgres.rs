//! Postgres-backed credential store.
//!
//! Each account row carries its token slots inline (digest plus expiry per
//! slot), so issue and consume are single-row writes. Digest lookups filter
//! on expiry in the query itself.

use anyhow::Context;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Connection, PgPool, Row};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use super::UserStore;
use crate::credential::account::{Account, AccountDraft, Provider, Role, TokenRecord, TokenSlot};
use crate::credential::error::StoreError;
use crate::credential::now_unix_seconds;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const fn lookup_by_email_query() -> &'static str {
    r"
    SELECT id, name, email, password_digest, verified, role, provider, created_at,
           email_verification_digest, email_verification_expires_at,
           password_reset_digest, password_reset_expires_at,
           refresh_digest, refresh_expires_at
    FROM accounts
    WHERE email = $1
    "
}

const fn lookup_by_id_query() -> &'static str {
    r"
    SELECT id, name, email, password_digest, verified, role, provider, created_at,
           email_verification_digest, email_verification_expires_at,
           password_reset_digest, password_reset_expires_at,
           refresh_digest, refresh_expires_at
    FROM accounts
    WHERE id = $1
    "
}

/// Slot-specific digest lookup. The expiry filter lives in the query so an
/// expired token never leaves the database.
const fn lookup_by_digest_query(slot: TokenSlot) -> &'static str {
    match slot {
        TokenSlot::EmailVerification => {
            r"
            SELECT id, name, email, password_digest, verified, role, provider, created_at,
                   email_verification_digest, email_verification_expires_at,
                   password_reset_digest, password_reset_expires_at,
                   refresh_digest, refresh_expires_at
            FROM accounts
            WHERE email_verification_digest = $1
              AND email_verification_expires_at > $2
            "
        }
        TokenSlot::PasswordReset => {
            r"
            SELECT id, name, email, password_digest, verified, role, provider, created_at,
                   email_verification_digest, email_verification_expires_at,
                   password_reset_digest, password_reset_expires_at,
                   refresh_digest, refresh_expires_at
            FROM accounts
            WHERE password_reset_digest = $1
              AND password_reset_expires_at > $2
            "
        }
        TokenSlot::Refresh => {
            r"
            SELECT id, name, email, password_digest, verified, role, provider, created_at,
                   email_verification_digest, email_verification_expires_at,
                   password_reset_digest, password_reset_expires_at,
                   refresh_digest, refresh_expires_at
            FROM accounts
            WHERE refresh_digest = $1
              AND refresh_expires_at > $2
            "
        }
    }
}

fn token_record_from(
    row: &PgRow,
    digest_column: &str,
    expires_column: &str,
) -> Option<TokenRecord> {
    let digest: Option<Vec<u8>> = row.get(digest_column);
    let expires_at: Option<i64> = row.get(expires_column);
    match (digest, expires_at) {
        (Some(digest), Some(expires_at)) => Some(TokenRecord { digest, expires_at }),
        _ => None,
    }
}

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        password_digest: row.get("password_digest"),
        verified: row.get("verified"),
        role: Role::parse(&row.get::<String, _>("role")),
        provider: Provider::parse(&row.get::<String, _>("provider")),
        created_at: row.get("created_at"),
        email_verification: token_record_from(
            row,
            "email_verification_digest",
            "email_verification_expires_at",
        ),
        password_reset: token_record_from(
            row,
            "password_reset_digest",
            "password_reset_expires_at",
        ),
        refresh: token_record_from(row, "refresh_digest", "refresh_expires_at"),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let query = lookup_by_email_query();
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by email")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, StoreError> {
        let query = lookup_by_id_query();
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by id")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn find_by_token_digest(
        &self,
        slot: TokenSlot,
        digest: &[u8],
        now: i64,
    ) -> Result<Option<Account>, StoreError> {
        let query = lookup_by_digest_query(slot);
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(digest)
            .bind(now)
            .fetch_optional(&self.pool)
            .instrument(span)
            .await
            .context("failed to lookup account by token digest")?;

        Ok(row.as_ref().map(account_from_row))
    }

    async fn create(&self, draft: AccountDraft) -> Result<Account, StoreError> {
        let created_at = now_unix_seconds();
        let query = r"
        INSERT INTO accounts
            (name, email, password_digest, verified, role, provider, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING id
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "INSERT",
            db.statement = query
        );
        let row = sqlx::query(query)
            .bind(draft.name.as_deref())
            .bind(&draft.email)
            .bind(draft.password_digest.as_deref())
            .bind(draft.verified)
            .bind(draft.role.as_str())
            .bind(draft.provider.as_str())
            .bind(created_at)
            .fetch_one(&self.pool)
            .instrument(span)
            .await;

        // The unique index on email is the arbiter under concurrent inserts.
        let id: Uuid = match row {
            Ok(row) => row.get("id"),
            Err(err) if is_unique_violation(&err) => return Err(StoreError::DuplicateEmail),
            Err(err) => {
                return Err(StoreError::Unavailable(
                    anyhow::Error::new(err).context("failed to insert account"),
                ));
            }
        };

        Ok(Account::from_draft(id, created_at, draft))
    }

    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let query = r"
        UPDATE accounts
        SET name = $2,
            email = $3,
            password_digest = $4,
            verified = $5,
            role = $6,
            provider = $7,
            email_verification_digest = $8,
            email_verification_expires_at = $9,
            password_reset_digest = $10,
            password_reset_expires_at = $11,
            refresh_digest = $12,
            refresh_expires_at = $13
        WHERE id = $1
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.statement = query
        );
        sqlx::query(query)
            .bind(account.id)
            .bind(account.name.as_deref())
            .bind(&account.email)
            .bind(account.password_digest.as_deref())
            .bind(account.verified)
            .bind(account.role.as_str())
            .bind(account.provider.as_str())
            .bind(account.email_verification.as_ref().map(|r| r.digest.as_slice()))
            .bind(account.email_verification.as_ref().map(|r| r.expires_at))
            .bind(account.password_reset.as_ref().map(|r| r.digest.as_slice()))
            .bind(account.password_reset.as_ref().map(|r| r.expires_at))
            .bind(account.refresh.as_ref().map(|r| r.digest.as_slice()))
            .bind(account.refresh.as_ref().map(|r| r.expires_at))
            .execute(&self.pool)
            .instrument(span)
            .await
            .context("failed to save account")?;

        Ok(())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        let query = r"
        SELECT id, name, email, password_digest, verified, role, provider, created_at,
               email_verification_digest, email_verification_expires_at,
               password_reset_digest, password_reset_expires_at,
               refresh_digest, refresh_expires_at
        FROM accounts
        ORDER BY created_at DESC, email ASC
        ";
        let span = info_span!(
            "db.query",
            db.system = "postgresql",
            db.operation = "SELECT",
            db.statement = query
        );
        let rows = sqlx::query(query)
            .fetch_all(&self.pool)
            .instrument(span)
            .await
            .context("failed to list accounts")?;

        Ok(rows.iter().map(account_from_row).collect())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .context("failed to acquire database connection")?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .context("failed to ping database")?;

        Ok(())
    }
}
