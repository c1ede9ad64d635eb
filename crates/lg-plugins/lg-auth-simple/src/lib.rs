//! # lg-auth-simple
//!
//! Argon2-based implementation of `AuthProvider`.
//! Handles password hashing and stateless signed session tokens.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use base64::Engine;
use lg_core::error::{AppError, Result};
use lg_core::traits::AuthProvider;
use sha2::{Digest, Sha256};
use uuid::Uuid;

const B64: base64::engine::general_purpose::GeneralPurpose =
    base64::engine::general_purpose::URL_SAFE_NO_PAD;

pub struct SimpleAuthProvider {
    /// Secret for signing session tokens (from an environment variable;
    /// rotating it invalidates all outstanding sessions).
    session_secret: String,
    /// Token lifetime in seconds.
    ttl_secs: i64,
}

impl SimpleAuthProvider {
    pub fn new(secret: &str) -> Self {
        Self {
            session_secret: secret.to_string(),
            ttl_secs: 30 * 24 * 3600,
        }
    }

    pub fn with_ttl(secret: &str, ttl_secs: i64) -> Self {
        Self {
            session_secret: secret.to_string(),
            ttl_secs,
        }
    }

    fn sign(&self, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.session_secret.as_bytes());
        hasher.update(payload.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl AuthProvider for SimpleAuthProvider {
    fn hash_password(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(AppError::internal)
    }

    /// Verifies a password against a stored Argon2 PHC string.
    fn verify_password(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(p) => p,
            Err(_) => return false,
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Token format: base64(user_id:expiry).hex(sha256(secret || payload)).
    fn issue_token(&self, user_id: Uuid) -> String {
        let expiry = chrono::Utc::now().timestamp() + self.ttl_secs;
        let payload = format!("{user_id}:{expiry}");
        format!("{}.{}", B64.encode(payload.as_bytes()), self.sign(&payload))
    }

    fn verify_token(&self, token: &str) -> Option<Uuid> {
        let (encoded, sig) = token.split_once('.')?;
        let payload_bytes = B64.decode(encoded).ok()?;
        let payload = String::from_utf8(payload_bytes).ok()?;
        if self.sign(&payload) != sig {
            return None;
        }
        let (user_id, expiry) = payload.split_once(':')?;
        let expiry: i64 = expiry.parse().ok()?;
        if chrono::Utc::now().timestamp() > expiry {
            return None;
        }
        Uuid::parse_str(user_id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_roundtrip() {
        let auth = SimpleAuthProvider::new("secret");
        let hash = auth.hash_password("hunter2").unwrap();
        assert!(auth.verify_password("hunter2", &hash));
        assert!(!auth.verify_password("hunter3", &hash));
        assert!(!auth.verify_password("hunter2", "not-a-phc-string"));
    }

    #[test]
    fn token_roundtrip_and_tamper_rejection() {
        let auth = SimpleAuthProvider::new("secret");
        let user_id = Uuid::now_v7();
        let token = auth.issue_token(user_id);
        assert_eq!(auth.verify_token(&token), Some(user_id));

        // Signed with a different secret
        let other = SimpleAuthProvider::new("other-secret");
        assert_eq!(other.verify_token(&token), None);

        // Garbage
        assert_eq!(auth.verify_token("zzz.123"), None);
        assert_eq!(auth.verify_token(""), None);
    }

    #[test]
    fn expired_token_rejected() {
        let auth = SimpleAuthProvider::with_ttl("secret", -60);
        let token = auth.issue_token(Uuid::now_v7());
        assert_eq!(auth.verify_token(&token), None);
    }
}
