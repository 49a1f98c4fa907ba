//! Password hashing (Argon2id, PHC string format).

use crate::error::{AppError, AppResult};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, SaltString},
    Algorithm, Argon2, Params, PasswordHasher as _, PasswordVerifier as _, Version,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Salted one-way hasher. The work factor is the Argon2 time cost.
///
/// Clones share one verification counter.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    verifications: Arc<AtomicU64>,
}

impl PasswordHasher {
    pub fn new(rounds: u32) -> AppResult<Self> {
        let params = Params::new(Params::DEFAULT_M_COST, rounds, Params::DEFAULT_P_COST, None)
            .map_err(|e| AppError::Config(format!("hash params: {}", e)))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            verifications: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("hash: {}", e)))?
            .to_string();
        Ok(hash)
    }

    /// Verify against a stored hash. Parameters come from the hash itself, so
    /// hashes made under an older work factor still verify.
    pub fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("parse hash: {}", e)))?;
        self.verifications.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok())
    }

    /// Number of password checks run so far.
    pub fn verifications(&self) -> u64 {
        self.verifications.load(Ordering::Relaxed)
    }
}
