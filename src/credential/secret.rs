//! Opaque token generation and storage digests.

use anyhow::{Context, Result};
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Generate a fresh opaque token: 32 bytes from the OS CSPRNG, URL-safe
/// base64 without padding so it survives query strings untouched.
///
/// The returned value is sent to the user exactly once; only its digest is
/// ever stored.
///
/// # Errors
///
/// Returns an error when the OS entropy source is unavailable.
pub fn generate_opaque_token() -> Result<String> {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .context("failed to generate opaque token")?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

/// Deterministic one-way digest of a token. Lookups hash the presented value
/// and compare digests; raw tokens never touch the store.
#[must_use]
pub fn token_digest(token: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hasher.finalize().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    #[test]
    fn generated_tokens_decode_to_32_bytes() {
        let decoded_len = generate_opaque_token()
            .ok()
            .and_then(|token| URL_SAFE_NO_PAD.decode(token.as_bytes()).ok())
            .map(|bytes| bytes.len());
        assert_eq!(decoded_len, Some(32));
    }

    #[test]
    fn generated_tokens_differ() {
        let first = generate_opaque_token().expect("token");
        let second = generate_opaque_token().expect("token");
        assert_ne!(first, second);
    }

    #[test]
    fn digest_is_deterministic_and_input_sensitive() {
        let first = token_digest("token");
        let second = token_digest("token");
        let different = token_digest("other");
        assert_eq!(first, second);
        assert_ne!(first, different);
        assert_eq!(first.len(), 32);
    }
}
