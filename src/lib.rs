//! # Atesti (Email Authentication & Session Tokens)
//!
//! `atesti` is an email/password and OAuth authentication service. Accounts
//! sign up with an email address, prove ownership through a mailed
//! verification link, and authenticate into a short-lived access token plus
//! a rotating refresh token.
//!
//! ## Token Model
//!
//! Every stored credential artifact is an **opaque single-use token**: the
//! server mails the raw value once and keeps only its SHA-256 digest next
//! to an expiry timestamp. Each account has three independent slots
//! (email verification, password reset, refresh); issuing into a slot
//! replaces whatever token was live there, and consuming a token clears the
//! slot before the caller sees success.
//!
//! Access tokens are the one exception: stateless HS256 JWTs verified by
//! signature and expiry alone, so they are not revocable before expiry.
//!
//! ## Authentication Flows
//!
//! - **Register** creates an unverified local account and mails a
//!   verification link; login is refused with `403` until the link is used.
//! - **Login** checks the Argon2id password digest and returns an access +
//!   refresh pair; `remember` stretches the refresh window from 7 to 30
//!   days.
//! - **OAuth login** upserts a federated account that is verified by
//!   definition and never holds a password digest.
//! - **Refresh rotation** is single-use: presenting a refresh token
//!   invalidates it and mints a replacement pair.
//!
//! Lookups by token never scan by digest alone; they also require the slot
//! to be unexpired, so an expired token is indistinguishable from an
//! unknown one.

pub mod api;
pub mod cli;
pub mod credential;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
