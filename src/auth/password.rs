/// Password Hashing and Verification
///
/// bcrypt is CPU bound, so the async entry points run it on actix's
/// blocking thread pool.

use actix_web::web;
use bcrypt::{hash, verify};

use crate::error::{AppError, ValidationError};

pub const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt silently ignores everything past this many bytes
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Validate password strength requirements
///
/// Requirements:
/// - Minimum 8 characters
/// - Maximum 72 bytes (UTF-8 encoded)
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::WeakPassword(MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::PasswordTooLong(MAX_PASSWORD_BYTES));
    }

    Ok(())
}

/// Hash a password with the given bcrypt cost
pub async fn hash_password(password: String, cost: u32) -> Result<String, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::PasswordTooLong(MAX_PASSWORD_BYTES).into());
    }

    web::block(move || hash(password, cost))
        .await?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// Input past `MAX_PASSWORD_BYTES` never matches: every stored hash came from
/// a password within the limit, and bcrypt would otherwise compare only the
/// truncated prefix.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, AppError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Ok(false);
    }

    web::block(move || verify(password, &password_hash))
        .await?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
