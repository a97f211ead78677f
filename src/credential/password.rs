//! Password hashing with Argon2id.
//!
//! Treated as an opaque one-way capability by the rest of the crate: hash on
//! registration and reset, verify on login. Stored digests are PHC strings.

use anyhow::{anyhow, Context, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Hash a password with a fresh random salt.
///
/// # Errors
///
/// Returns an error when hashing fails (bad parameters or entropy failure).
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("{err}"))
        .context("failed to hash password")?;
    Ok(hash.to_string())
}

/// Verify a candidate password against a stored PHC digest.
///
/// A mismatch is `Ok(false)`; only malformed digests or hasher failures are
/// errors, so callers can distinguish "wrong password" from "broken record".
///
/// # Errors
///
/// Returns an error when the stored digest cannot be parsed or verification
/// fails for a reason other than a mismatch.
pub fn verify_password(password: &str, digest: &str) -> Result<bool> {
    let parsed = PasswordHash::new(digest)
        .map_err(|err| anyhow!("{err}"))
        .context("stored password digest is malformed")?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(anyhow!("{err}")).context("failed to verify password"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_round_trip() {
        let digest = hash_password("correct horse").expect("hash");
        assert!(digest.starts_with("$argon2id$"));
        assert_eq!(verify_password("correct horse", &digest).ok(), Some(true));
        assert_eq!(verify_password("wrong horse", &digest).ok(), Some(false));
    }

    #[test]
    fn same_password_hashes_differently() {
        let first = hash_password("pw").expect("hash");
        let second = hash_password("pw").expect("hash");
        assert_ne!(first, second);
    }

    #[test]
    fn malformed_digest_is_an_error_not_a_mismatch() {
        assert!(verify_password("pw", "not-a-phc-string").is_err());
    }
}
