use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

/// Credential hashing and comparison, kept behind a seam so the scheme can
/// change without touching the verifier or the reset manager.
pub trait CredentialMatcher: Send + Sync {
    /// Produce the stored form of a new credential.
    fn hash(&self, plain: &str) -> anyhow::Result<String>;
    /// Compare a submitted credential against the stored form.
    fn verify(&self, plain: &str, stored: &str) -> anyhow::Result<bool>;
}

/// Default scheme: salted argon2.
pub struct Argon2Matcher;

impl CredentialMatcher for Argon2Matcher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let hash = argon2
            .hash_password(plain.as_bytes(), &salt)
            .map_err(|e| {
                error!(error = %e, "argon2 hash_password error");
                anyhow::anyhow!(e.to_string())
            })?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, plain: &str, stored: &str) -> anyhow::Result<bool> {
        let parsed = PasswordHash::new(stored).map_err(|e| {
            error!(error = %e, "argon2 parse hash error");
            anyhow::anyhow!(e.to_string())
        })?;
        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

/// Legacy scheme for databases carried over from the old backend, which
/// stored passwords as-is. Comparison stays constant-time per byte.
pub struct PlaintextMatcher;

impl CredentialMatcher for PlaintextMatcher {
    fn hash(&self, plain: &str) -> anyhow::Result<String> {
        Ok(plain.to_string())
    }

    fn verify(&self, plain: &str, stored: &str) -> anyhow::Result<bool> {
        Ok(constant_time_eq(plain.as_bytes(), stored.as_bytes()))
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
