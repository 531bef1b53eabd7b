//! Password hashing and bearer token generation.
//!
//! Passwords are hashed with Argon2id at its default parameters and stored
//! as PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so the
//! parameters travel with each hash. Bearer tokens are random and stored
//! only as a SHA-256 digest: they carry 256 bits of entropy, so a fast hash
//! is enough for them.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use sha2::{Digest, Sha256};

const TOKEN_LEN: usize = 32;

/// Hash `password` with a fresh random salt into a PHC string.
///
/// # Errors
///
/// Fails only if Argon2 rejects the input, e.g. a password longer than
/// its 4 GiB limit.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Check `password` against a PHC string. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, encoded: &str) -> bool {
    PasswordHash::new(encoded).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Generate a 256-bit random bearer token, base64url encoded.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0_u8; TOKEN_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Digest under which a bearer token is stored.
#[must_use]
pub fn token_digest(token: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verifies_only_the_right_password() {
        let encoded = hash_password("hunter2hunter2").unwrap();
        assert!(verify_password("hunter2hunter2", &encoded));
        assert!(!verify_password("hunter3hunter3", &encoded));
    }

    #[test]
    fn test_hash_is_an_argon2id_phc_string() {
        let encoded = hash_password("samepassword").unwrap();
        assert!(encoded.starts_with("$argon2id$v=19$"), "{encoded}");
        assert!(!encoded.contains("samepassword"));
    }

    #[test]
    fn test_same_password_gets_different_salts() {
        let a = hash_password("samepassword").unwrap();
        let b = hash_password("samepassword").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("samepassword", &a));
        assert!(verify_password("samepassword", &b));
    }

    #[test]
    fn test_malformed_hashes_never_verify() {
        for encoded in [
            "",
            "$argon2id$",
            "sha256$10000$c2FsdA$ZGlnZXN0",
            "$argon2id$v=19$m=19456,t=2,p=1$!!$??",
            "plaintext-password",
        ] {
            assert!(!verify_password("anything", encoded), "{encoded} verified");
        }
    }

    #[test]
    fn test_tokens_are_unique_and_digest_is_stable() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 43);
        assert_eq!(token_digest(&a), token_digest(&a));
        assert_ne!(token_digest(&a), a);
    }
}
