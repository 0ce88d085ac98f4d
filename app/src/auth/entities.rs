//! Handles user authentication. Authentication is proven by possession of a signed token;
//! a validated token yields a [`Grant`], which the rest of the crate accepts as proof of the
//! caller's identity.

use argon2::{
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::user;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("token has expired")]
    Expired,
    #[error("token is invalid")]
    Invalid,
}

/// This grant represents a compile-time proof that a request carried a valid token for the user.
#[derive(Debug, Clone, Copy)]
pub struct Grant {
    pub user_id: user::Id,
}

/// The signed token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

/// A salted Argon2id hash of a user password. Only the hash is ever persisted.
#[derive(Debug)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn generate(password: &str) -> Self {
        let salt = SaltString::generate(&mut OsRng);
        // Hashing only fails on invalid parameters, and we use the defaults.
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .unwrap();
        Self(hash.to_string())
    }

    pub fn verify(&self, password: &str) -> bool {
        password_hash::PasswordHash::new(&self.0)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_stored(hash: String) -> Self {
        Self(hash)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_round_trip() {
        let hash = PasswordHash::generate("hunter2");
        assert!(hash.verify("hunter2"));
        assert!(!hash.verify("hunter3"));
    }

    #[test]
    fn hashes_are_salted() {
        let a = PasswordHash::generate("hunter2");
        let b = PasswordHash::generate("hunter2");
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn corrupt_stored_hash_never_verifies() {
        let hash = PasswordHash::from_stored("not-a-phc-string".to_owned());
        assert!(!hash.verify("hunter2"));
    }
}
