use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::models::NewUser;
use crate::db::repository::UserRepository;
use crate::error::{AppError, AuthError, DatabaseError};
use crate::Result;

/// Account registration and password checks on top of a `UserRepository`.
///
/// Passwords are stored as Argon2id PHC strings with a fresh random salt per
/// record. Hashing runs on the blocking pool.
pub struct CredentialStore {
    users: Arc<dyn UserRepository>,
    /// Checked against when the email is unknown, so both misses cost one Argon2 run.
    dummy_hash: OnceCell<String>,
}

const DUMMY_PASSWORD: &str = "no-such-account";

impl CredentialStore {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self {
            users,
            dummy_hash: OnceCell::new(),
        }
    }

    /// Creates an account and returns its id.
    pub async fn register(&self, email: &str, password: &str) -> Result<Uuid> {
        if self.users.find_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateEmail.into());
        }

        let hash = hash_password(password.to_owned()).await?;

        // A concurrent signup can still win the race between lookup and insert.
        let user = self
            .users
            .insert_user(NewUser::new(email, hash))
            .await
            .map_err(|e| match e {
                DatabaseError::Duplicate => AppError::AuthError(AuthError::DuplicateEmail),
                other => AppError::DatabaseError(other),
            })?;

        info!("Registered user {}", user.id);
        Ok(user.id)
    }

    /// Checks a password and returns the account id it belongs to.
    pub async fn verify(&self, email: &str, password: &str) -> Result<Uuid> {
        let Some(user) = self.users.find_by_email(email).await? else {
            let dummy = self
                .dummy_hash
                .get_or_try_init(|| hash_password(DUMMY_PASSWORD.to_owned()))
                .await?;
            verify_password(password.to_owned(), dummy.clone()).await?;
            return Err(AuthError::NotFound.into());
        };

        if !verify_password(password.to_owned(), user.hash).await? {
            warn!("Password mismatch for user {}", user.id);
            return Err(AuthError::InvalidCredentials.into());
        }

        Ok(user.id)
    }
}

async fn hash_password(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?
}

async fn verify_password(password: String, hash: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed = PasswordHash::new(&hash)
            .map_err(|e| AppError::InternalError(format!("Invalid password hash format: {}", e)))?;

        // Argon2 compares digests in constant time.
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(AppError::InternalError(format!(
                "Password verification failed: {}",
                e
            ))),
        }
    })
    .await
    .map_err(|e| AppError::InternalError(e.to_string()))?
}
