//! Argon2 credentials for stored users.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use tracing::error;

use crate::auth::repo_types::UserError;

lazy_static! {
    /// Verified against when no user has the submitted email, so an unknown
    /// email costs as much as a wrong password.
    static ref DUMMY_HASH: Option<String> = hash_password("not-a-real-account").ok();
}

/// PHC string for `plain` with a fresh random salt.
pub fn hash_password(plain: &str) -> Result<String, UserError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hash failed");
            UserError::Hashing(e.to_string())
        })
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(plain: &str, hash: &str) -> Result<bool, UserError> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        UserError::Hashing(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Accept `plain` against the user's stored hash. `None` means no such user;
/// it fails the same way a wrong password does.
pub fn check_credentials(plain: &str, stored: Option<&str>) -> Result<(), UserError> {
    match stored {
        Some(hash) if verify_password(plain, hash)? => Ok(()),
        Some(_) => Err(UserError::InvalidCredentials),
        None => {
            if let Some(dummy) = DUMMY_HASH.as_deref() {
                let _ = verify_password(plain, dummy);
            }
            Err(UserError::InvalidCredentials)
        }
    }
}
