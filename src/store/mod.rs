/// Persistence backends
///
/// The rest of the crate talks to storage through the two repository traits
/// below. `PgStore` is the production backend; `InMemoryStore` backs the
/// test suite and the `memory` storage mode.
///
/// Implementations must enforce email/username uniqueness themselves (not
/// just rely on callers checking first) and must revoke a user's tokens in a
/// single atomic step.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Department, NewUser, User};
use crate::error::AppError;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user, failing with `ConflictError` on a duplicate email or
    /// username.
    async fn insert(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError>;
    /// `email` must already be normalized.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    /// All users ordered by id
    async fn list_all(&self) -> Result<Vec<User>, AppError>;
    async fn list_by_department(&self, department: Department) -> Result<Vec<User>, AppError>;
    /// Sets both `last_login` and `updated_at` to `at`
    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError>;
}

/// Server-side record of an issued refresh token
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: i64,
    /// SHA-256 of the token; the plaintext is never stored
    pub token_hash: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AppError>;
    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError>;
    /// Marks the token revoked, keeping the original revocation time if it
    /// was already revoked. Returns `false` when no such token exists.
    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, AppError>;
    /// Revokes every outstanding token of the user and returns how many were
    /// newly revoked.
    async fn revoke_all_for_user(&self, user_id: i64, at: DateTime<Utc>) -> Result<u64, AppError>;
}

/// The pair of repositories the application runs on
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
}

impl Repositories {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PgStore::new(pool));
        Self {
            users: store.clone(),
            refresh_tokens: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::default());
        Self {
            users: store.clone(),
            refresh_tokens: store,
        }
    }
}
