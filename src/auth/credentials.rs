/// Credential Validator
///
/// Checks an email/password pair against the stored bcrypt hash. Callers
/// only ever see `InvalidCredentials`; which check failed is logged.

use std::fmt;

use crate::auth::password::verify_password;
use crate::domain::User;
use crate::error::{AppError, AuthError};
use crate::user_store::UserStore;

#[derive(Debug)]
pub enum CredentialError {
    NotFound,
    BadSecret,
    Inactive,
    Store(AppError),
}

impl fmt::Display for CredentialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialError::NotFound => write!(f, "no user with that email"),
            CredentialError::BadSecret => write!(f, "password does not match"),
            CredentialError::Inactive => write!(f, "account is inactive"),
            CredentialError::Store(e) => write!(f, "{}", e),
        }
    }
}

impl From<AppError> for CredentialError {
    fn from(err: AppError) -> Self {
        CredentialError::Store(err)
    }
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::Store(e) => e,
            reason => {
                tracing::info!(reason = %reason, "Authentication rejected");
                AppError::Auth(AuthError::InvalidCredentials)
            }
        }
    }
}

/// Authenticate by email (normalized before lookup) and password
pub async fn authenticate(users: &UserStore, email: &str, password: &str) -> Result<User, CredentialError> {
    let user = users
        .find_by_email(email)
        .await?
        .ok_or(CredentialError::NotFound)?;

    if !user.is_active {
        return Err(CredentialError::Inactive);
    }

    if !verify_password(password.to_string(), user.password_hash.clone()).await? {
        return Err(CredentialError::BadSecret);
    }

    Ok(user)
}
