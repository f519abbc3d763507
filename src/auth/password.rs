/// Password Hashing and Verification
///
/// Argon2id with cost parameters fixed at start-up. The salt and parameters are
/// embedded in the PHC string, so the stored hash is the only record needed.
/// Hashing is deliberately expensive; the async entry points run it on the
/// blocking pool and cap how many run at once.

use argon2::password_hash::{Error as PhcError, SaltString};
use argon2::{
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher as _, PasswordVerifier as _, Version,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, Secret};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::configuration::HashingSettings;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("stored password hash is malformed")]
    HashFormat,
    #[error("password hashing failed: {0}")]
    Internal(String),
}

#[derive(Clone)]
pub struct PasswordHasher {
    params: Params,
    permits: Arc<Semaphore>,
    // verified against when the account does not exist
    dummy_hash: Arc<str>,
}

impl PasswordHasher {
    pub fn new(settings: &HashingSettings) -> Result<Self, PasswordError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| PasswordError::Internal(format!("invalid argon2 parameters: {}", e)))?;

        let mut hasher = Self {
            params,
            permits: Arc::new(Semaphore::new(settings.max_concurrent)),
            dummy_hash: Arc::from(""),
        };
        hasher.dummy_hash = Arc::from(hasher.hash("not-a-real-password")?);
        Ok(hasher)
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a password into a PHC string (blocks the calling thread)
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(OsRng);

        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::Internal(e.to_string()))
    }

    /// Verify a password against a stored PHC string.
    ///
    /// Comparison is done by argon2 in constant time. The parameters encoded in
    /// the hash are used, so records hashed under older settings still verify.
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(hash).map_err(|_| PasswordError::HashFormat)?;

        match self.argon2().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(_) => Err(PasswordError::HashFormat),
        }
    }

    /// Spend the same effort as a real verification and report no match.
    pub fn verify_dummy(&self, password: &str) -> bool {
        let _ = self.verify(password, &self.dummy_hash);
        false
    }

    pub async fn hash_blocking(&self, password: Secret<String>) -> Result<String, PasswordError> {
        self.run_blocking(move |hasher| hasher.hash(password.expose_secret()))
            .await?
    }

    pub async fn verify_blocking(
        &self,
        password: Secret<String>,
        hash: String,
    ) -> Result<bool, PasswordError> {
        self.run_blocking(move |hasher| hasher.verify(password.expose_secret(), &hash))
            .await?
    }

    pub async fn verify_dummy_blocking(&self, password: Secret<String>) -> Result<bool, PasswordError> {
        self.run_blocking(move |hasher| hasher.verify_dummy(password.expose_secret()))
            .await
    }

    async fn run_blocking<F, T>(&self, work: F) -> Result<T, PasswordError>
    where
        F: FnOnce(&PasswordHasher) -> T + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| PasswordError::Internal(e.to_string()))?;
        let hasher = self.clone();

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            work(&hasher)
        })
        .await
        .map_err(|e| PasswordError::Internal(format!("hashing task failed: {}", e)))
    }
}
