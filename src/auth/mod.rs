/// Authentication module
///
/// Handles password hashing, credential checks, JWT access tokens and
/// refresh token management.

mod claims;
mod credentials;
mod jwt;
mod password;
mod refresh_token;
mod token_service;

pub use claims::Claims;
pub use credentials::{authenticate, CredentialError};
pub use password::{hash_password, validate_password_strength};
pub use token_service::{TokenPair, TokenService, REFRESH_TOKEN_COOKIE};
