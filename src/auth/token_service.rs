/// Token Service
///
/// Issues access/refresh pairs, verifies access tokens, exchanges refresh
/// tokens for new access tokens and revokes refresh tokens.
///
/// Refresh token lifecycle: issued at login, usable any number of times to
/// mint access tokens until it expires or is revoked. Revocation is
/// terminal. Access tokens are never stored and simply expire.

use actix_web::cookie::{time, Cookie, SameSite};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::claims::Claims;
use crate::auth::jwt::{generate_access_token, validate_access_token};
use crate::auth::refresh_token::{generate_refresh_token, hash_token};
use crate::configuration::JwtSettings;
use crate::domain::User;
use crate::error::{AppError, AuthError};
use crate::store::{RefreshTokenRecord, RefreshTokenRepository};
use crate::user_store::UserStore;

pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

/// Freshly issued credentials for one login
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Clone)]
pub struct TokenService {
    config: JwtSettings,
    refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl TokenService {
    pub fn new(config: JwtSettings, refresh_tokens: Arc<dyn RefreshTokenRepository>) -> Self {
        Self {
            config,
            refresh_tokens,
        }
    }

    pub fn config(&self) -> &JwtSettings {
        &self.config
    }

    /// Mint an access token and record a new outstanding refresh token
    pub async fn issue_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token = generate_access_token(user, &self.config)?;
        let refresh_token = generate_refresh_token();

        let issued_at = Utc::now();
        self.refresh_tokens
            .insert(RefreshTokenRecord {
                id: Uuid::new_v4(),
                user_id: user.id,
                token_hash: hash_token(&refresh_token),
                issued_at,
                expires_at: issued_at + Duration::seconds(self.config.refresh_token_expiry),
                revoked_at: None,
            })
            .await?;

        tracing::debug!(user_id = user.id, "Issued token pair");

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AppError> {
        validate_access_token(token, &self.config)
    }

    /// Exchange a refresh token for a new access token
    ///
    /// The refresh token is not rotated. Fails if it is unknown, revoked or
    /// expired, or if its owner no longer exists or was deactivated.
    pub async fn refresh_access(&self, refresh_token: &str, users: &UserStore) -> Result<String, AppError> {
        let record = self
            .refresh_tokens
            .find_by_hash(&hash_token(refresh_token))
            .await?
            .ok_or_else(|| {
                tracing::warn!("Refresh token not found");
                AppError::Auth(AuthError::TokenNotFound)
            })?;

        if record.is_revoked() {
            tracing::warn!(user_id = record.user_id, "Attempt to use revoked refresh token");
            return Err(AuthError::TokenRevoked.into());
        }

        if record.is_expired(Utc::now()) {
            tracing::info!(user_id = record.user_id, "Refresh token expired");
            return Err(AuthError::TokenExpired.into());
        }

        let user = users
            .find_by_id(record.user_id)
            .await?
            .filter(|u| u.is_active)
            .ok_or(AppError::Auth(AuthError::InvalidCredentials))?;

        generate_access_token(&user, &self.config)
    }

    /// Revoke one refresh token. Revoking an already revoked token succeeds.
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AppError> {
        let found = self
            .refresh_tokens
            .revoke(&hash_token(refresh_token), Utc::now())
            .await?;

        if found {
            Ok(())
        } else {
            Err(AuthError::TokenNotFound.into())
        }
    }

    /// Revoke every outstanding refresh token of a user, returning how many
    /// were newly revoked.
    pub async fn revoke_all_for_user(&self, user_id: i64) -> Result<u64, AppError> {
        let revoked = self
            .refresh_tokens
            .revoke_all_for_user(user_id, Utc::now())
            .await?;

        tracing::info!(user_id = user_id, revoked = revoked, "Refresh tokens revoked for user");
        Ok(revoked)
    }

    /// Cookie carrying the refresh token back to the client
    pub fn refresh_cookie(&self, refresh_token: String) -> Cookie<'static> {
        Cookie::build(REFRESH_TOKEN_COOKIE, refresh_token)
            .path("/")
            .http_only(true)
            .secure(self.config.secure_cookies)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.config.refresh_token_expiry))
            .finish()
    }

    /// Cookie that makes the client drop the refresh token
    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut cookie = Cookie::build(REFRESH_TOKEN_COOKIE, "")
            .path("/")
            .http_only(true)
            .secure(self.config.secure_cookies)
            .same_site(SameSite::Lax)
            .finish();
        cookie.make_removal();
        cookie
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Department, NewUser};
    use crate::store::{InMemoryStore, UserRepository};
    use crate::user_store::NewAccount;

    fn config() -> JwtSettings {
        JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 86400,
            issuer: "test".to_string(),
            secure_cookies: true,
        }
    }

    async fn setup(config: JwtSettings) -> (TokenService, UserStore, User) {
        let store = Arc::new(InMemoryStore::default());
        let users = UserStore::new(store.clone(), 4);
        let tokens = TokenService::new(config, store);
        let user = users
            .create(NewAccount {
                email: Some("a@x.com".to_string()),
                username: Some("a".to_string()),
                password: Some("longenough1".to_string()),
                ..NewAccount::default()
            })
            .await
            .expect("registration should succeed");
        (tokens, users, user)
    }

    #[tokio::test]
    async fn test_issued_access_token_verifies() {
        let (tokens, _, user) = setup(config()).await;
        let pair = tokens.issue_pair(&user).await.unwrap();

        let claims = tokens.verify_access(&pair.access_token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_ne!(pair.access_token, pair.refresh_token);
    }

    #[tokio::test]
    async fn test_refresh_token_mints_access_tokens_repeatedly() {
        let (tokens, users, user) = setup(config()).await;
        let pair = tokens.issue_pair(&user).await.unwrap();

        for _ in 0..3 {
            let access = tokens.refresh_access(&pair.refresh_token, &users).await.unwrap();
            let claims = tokens.verify_access(&access).unwrap();
            assert_eq!(claims.user_id().unwrap(), user.id);
        }
    }

    #[tokio::test]
    async fn test_revoked_refresh_token_never_mints_again() {
        let (tokens, users, user) = setup(config()).await;
        let pair = tokens.issue_pair(&user).await.unwrap();

        tokens.revoke(&pair.refresh_token).await.unwrap();
        // idempotent
        tokens.revoke(&pair.refresh_token).await.unwrap();

        let result = tokens.refresh_access(&pair.refresh_token, &users).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::TokenRevoked))));
    }

    #[tokio::test]
    async fn test_unknown_refresh_token() {
        let (tokens, users, _) = setup(config()).await;

        assert!(matches!(
            tokens.revoke("never-issued").await,
            Err(AppError::Auth(AuthError::TokenNotFound))
        ));
        assert!(matches!(
            tokens.refresh_access("never-issued", &users).await,
            Err(AppError::Auth(AuthError::TokenNotFound))
        ));
    }

    #[tokio::test]
    async fn test_expired_refresh_token() {
        let mut short_lived = config();
        short_lived.refresh_token_expiry = -1;
        let (tokens, users, user) = setup(short_lived).await;
        let pair = tokens.issue_pair(&user).await.unwrap();

        let result = tokens.refresh_access(&pair.refresh_token, &users).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::TokenExpired))));
    }

    #[tokio::test]
    async fn test_refresh_fails_once_the_account_is_inactive() {
        let store = Arc::new(InMemoryStore::default());
        let users = UserStore::new(store.clone(), 4);
        let tokens = TokenService::new(config(), store.clone());
        let inactive = UserRepository::insert(
            store.as_ref(),
            NewUser {
                email: "gone@x.com".to_string(),
                username: "gone".to_string(),
                password_hash: "unused".to_string(),
                department: Department::Dev,
                phone: None,
                is_staff: false,
                is_active: false,
            },
        )
        .await
        .unwrap();

        // token issued while the account was still usable
        let pair = tokens.issue_pair(&inactive).await.unwrap();

        let result = tokens.refresh_access(&pair.refresh_token, &users).await;
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_revoke_all_for_user_is_idempotent() {
        let (tokens, users, user) = setup(config()).await;
        let first = tokens.issue_pair(&user).await.unwrap();
        let second = tokens.issue_pair(&user).await.unwrap();

        assert_eq!(tokens.revoke_all_for_user(user.id).await.unwrap(), 2);
        assert_eq!(tokens.revoke_all_for_user(user.id).await.unwrap(), 0);

        for pair in [first, second] {
            assert!(tokens.refresh_access(&pair.refresh_token, &users).await.is_err());
        }
    }

    #[tokio::test]
    async fn test_refresh_cookie_attributes() {
        let (tokens, _, _) = setup(config()).await;
        let cookie = tokens.refresh_cookie("abc".to_string());

        assert_eq!(cookie.name(), "refresh_token");
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.max_age(), Some(time::Duration::hours(24)));

        let removal = tokens.removal_cookie();
        assert_eq!(removal.name(), "refresh_token");
        assert_eq!(removal.value(), "");
        assert_eq!(removal.max_age(), Some(time::Duration::ZERO));
    }
}
