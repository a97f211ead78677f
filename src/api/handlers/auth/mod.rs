//! Auth handlers and supporting modules.
//!
//! Registration, email verification, password and federated login, password
//! reset, refresh-token rotation and logout, plus the bearer guard used by
//! protected routes.
//!
//! ## Rate limiting
//!
//! Every route checks a fixed window (100 requests per 15 minutes) per
//! client IP before doing any other work; login and forgot-password add a
//! per-email window to slow targeted guessing against one account.
//!
//! ## Token handling
//!
//! Raw verification, reset and refresh tokens exist only in the issuing
//! response or mailed link; handlers hand them straight to the credential
//! core, which stores digests.

pub(crate) mod login;
pub(crate) mod password;
pub(crate) mod principal;
mod rate_limit;
pub(crate) mod register;
pub(crate) mod session;
mod state;
pub(crate) mod types;

pub use rate_limit::{FixedWindowRateLimiter, NoopRateLimiter, RateLimiter};
pub use state::AuthState;

#[cfg(test)]
mod tests;
