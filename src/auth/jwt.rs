/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed and self-contained: verifying one needs
/// only the shared secret, never a store lookup.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::Claims;
use crate::configuration::JwtSettings;
use crate::domain::User;
use crate::error::{AppError, AuthError};

/// Generate a new access token for a user
///
/// # Errors
/// Returns error if token generation fails
pub fn generate_access_token(user: &User, config: &JwtSettings) -> Result<String, AppError> {
    let claims = Claims::new(user, config.access_token_expiry, config.issuer.clone());

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate and extract claims from an access token
///
/// # Errors
/// - `TokenExpired` when `exp` has passed
/// - `TokenBadSignature` when the signature does not match
/// - `TokenMalformed` for anything else (bad encoding, wrong issuer, ...)
pub fn validate_access_token(token: &str, config: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation error: {}", e);
        let kind = match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidSignature => AuthError::TokenBadSignature,
            _ => AuthError::TokenMalformed,
        };
        AppError::Auth(kind)
    })
}
