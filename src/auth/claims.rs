/// JWT Claims structure
///
/// Payload of an access token: the user it was issued to plus the standard
/// registered claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::User;
use crate::error::{AppError, AuthError};

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id)
    pub sub: String,
    /// User email
    pub email: String,
    /// Whether the user was staff when the token was issued
    #[serde(default)]
    pub staff: bool,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Issuer
    pub iss: String,
    /// Unique token id
    pub jti: String,
}

impl Claims {
    /// Create claims for `user` that expire `expiry_seconds` from now
    pub fn new(user: &User, expiry_seconds: i64, issuer: String) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user.id.to_string(),
            email: user.email.clone(),
            staff: user.is_staff,
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer,
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Extract user ID from claims
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.sub
            .parse::<i64>()
            .map_err(|_| AppError::Auth(AuthError::TokenMalformed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Department;

    fn user(id: i64, is_staff: bool) -> User {
        let now = chrono::Utc::now();
        User {
            id,
            email: "test@example.com".to_string(),
            username: "test".to_string(),
            password_hash: String::new(),
            department: Department::Dev,
            phone: None,
            is_staff,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_claims_creation() {
        let claims = Claims::new(&user(7, true), 3600, "test".to_string());

        assert_eq!(claims.sub, "7");
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "test");
        assert!(claims.staff);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_every_token_gets_its_own_id() {
        let a = Claims::new(&user(1, false), 3600, "test".to_string());
        let b = Claims::new(&user(1, false), 3600, "test".to_string());
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_user_id_extraction() {
        let claims = Claims::new(&user(99, false), 3600, "test".to_string());
        assert_eq!(claims.user_id().unwrap(), 99);
    }

    #[test]
    fn test_invalid_user_id() {
        let mut claims = Claims::new(&user(1, false), 3600, "test".to_string());
        claims.sub = "not-a-number".to_string();

        assert!(matches!(
            claims.user_id(),
            Err(AppError::Auth(AuthError::TokenMalformed))
        ));
    }
}
