//! Account credential hashing.
//!
//! Credentials are stored as a salted SHA-256 digest. The raw password is
//! never persisted and the hash never leaves this crate's read models.

use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::error::{ClinicError, ClinicResult};

/// Minimum accepted password length.
const MIN_PASSWORD_LEN: usize = 6;

/// A salted password digest stored on an account document.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CredentialHash {
    salt: String,
    digest: String,
}

impl CredentialHash {
    /// Derives a credential hash from a plaintext password with a fresh
    /// random salt.
    ///
    /// # Errors
    ///
    /// Returns `ClinicError::Validation` if the password is shorter than
    /// six characters.
    pub fn derive(password: &str) -> ClinicResult<Self> {
        if password.len() < MIN_PASSWORD_LEN {
            return Err(ClinicError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let mut salt_bytes = [0u8; 16];
        rand::thread_rng().fill_bytes(&mut salt_bytes);
        let salt = hex::encode(salt_bytes);
        let digest = digest_with_salt(&salt, password);

        Ok(Self { salt, digest })
    }

    /// Checks a plaintext password against the stored digest.
    pub fn verify(&self, password: &str) -> bool {
        digest_with_salt(&self.salt, password) == self.digest
    }
}

fn digest_with_salt(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_and_verify_round_trip() {
        let hash = CredentialHash::derive("correct horse").expect("derive should succeed");
        assert!(hash.verify("correct horse"));
        assert!(!hash.verify("wrong horse"));
    }

    #[test]
    fn derive_rejects_short_passwords() {
        let err = CredentialHash::derive("short").expect_err("five characters should fail");
        assert!(matches!(err, ClinicError::Validation(_)));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = CredentialHash::derive("correct horse").unwrap();
        let b = CredentialHash::derive("correct horse").unwrap();
        assert_ne!(a, b, "fresh salts should produce distinct hashes");
    }
}
