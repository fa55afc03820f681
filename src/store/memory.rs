use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{Department, NewUser, User};
use crate::error::{AppError, ConflictError};
use crate::store::{RefreshTokenRecord, RefreshTokenRepository, UserRepository};

#[derive(Default)]
struct UserTable {
    next_id: i64,
    rows: Vec<User>,
}

/// Process-local store
///
/// Each table sits behind its own mutex; every operation takes the lock once
/// and never holds it across an await point.
#[derive(Default)]
pub struct InMemoryStore {
    users: Mutex<UserTable>,
    refresh_tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert(&self, user: NewUser) -> Result<User, AppError> {
        let mut table = lock(&self.users)?;

        if table.rows.iter().any(|u| u.email == user.email) {
            return Err(ConflictError::DuplicateEmail.into());
        }
        if table.rows.iter().any(|u| u.username == user.username) {
            return Err(ConflictError::DuplicateUsername.into());
        }

        table.next_id += 1;
        let now = Utc::now();
        let stored = User {
            id: table.next_id,
            email: user.email,
            username: user.username,
            password_hash: user.password_hash,
            department: user.department,
            phone: user.phone,
            is_staff: user.is_staff,
            is_active: user.is_active,
            last_login: None,
            created_at: now,
            updated_at: now,
        };
        table.rows.push(stored.clone());

        Ok(stored)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let table = lock(&self.users)?;
        Ok(table.rows.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let table = lock(&self.users)?;
        Ok(table.rows.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let table = lock(&self.users)?;
        Ok(table.rows.iter().find(|u| u.username == username).cloned())
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let table = lock(&self.users)?;
        Ok(table.rows.clone())
    }

    async fn list_by_department(&self, department: Department) -> Result<Vec<User>, AppError> {
        let table = lock(&self.users)?;
        Ok(table
            .rows
            .iter()
            .filter(|u| u.department == department)
            .cloned()
            .collect())
    }

    async fn record_login(&self, id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        let mut table = lock(&self.users)?;
        if let Some(user) = table.rows.iter_mut().find(|u| u.id == id) {
            user.last_login = Some(at);
            user.updated_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryStore {
    async fn insert(&self, record: RefreshTokenRecord) -> Result<(), AppError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(&self, token_hash: &str) -> Result<Option<RefreshTokenRecord>, AppError> {
        let tokens = lock(&self.refresh_tokens)?;
        Ok(tokens.get(token_hash).cloned())
    }

    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        match tokens.get_mut(token_hash) {
            Some(record) => {
                record.revoked_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_for_user(&self, user_id: i64, at: DateTime<Utc>) -> Result<u64, AppError> {
        let mut tokens = lock(&self.refresh_tokens)?;
        let mut revoked = 0;
        for record in tokens
            .values_mut()
            .filter(|r| r.user_id == user_id && r.revoked_at.is_none())
        {
            record.revoked_at = Some(at);
            revoked += 1;
        }
        Ok(revoked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn new_user(email: &str, username: &str, department: Department) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            password_hash: "hash".to_string(),
            department,
            phone: None,
            is_staff: false,
            is_active: true,
        }
    }

    fn record(user_id: i64, token_hash: &str) -> RefreshTokenRecord {
        let now = Utc::now();
        RefreshTokenRecord {
            id: Uuid::new_v4(),
            user_id,
            token_hash: token_hash.to_string(),
            issued_at: now,
            expires_at: now + Duration::hours(24),
            revoked_at: None,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_ascending_ids() {
        let store = InMemoryStore::default();
        let first = UserRepository::insert(&store, new_user("a@x.com", "a", Department::Dev))
            .await
            .unwrap();
        let second = UserRepository::insert(&store, new_user("b@x.com", "b", Department::Hr))
            .await
            .unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert!(first.last_login.is_none());
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicates() {
        let store = InMemoryStore::default();
        UserRepository::insert(&store, new_user("a@x.com", "a", Department::Dev))
            .await
            .unwrap();

        let dup_email = UserRepository::insert(&store, new_user("a@x.com", "other", Department::Dev)).await;
        assert!(matches!(
            dup_email,
            Err(AppError::Conflict(ConflictError::DuplicateEmail))
        ));

        let dup_username = UserRepository::insert(&store, new_user("c@x.com", "a", Department::Dev)).await;
        assert!(matches!(
            dup_username,
            Err(AppError::Conflict(ConflictError::DuplicateUsername))
        ));

        assert_eq!(store.list_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_by_department() {
        let store = InMemoryStore::default();
        UserRepository::insert(&store, new_user("a@x.com", "a", Department::Admin))
            .await
            .unwrap();
        UserRepository::insert(&store, new_user("b@x.com", "b", Department::Dev))
            .await
            .unwrap();

        let admins = store.list_by_department(Department::Admin).await.unwrap();
        assert_eq!(admins.len(), 1);
        assert_eq!(admins[0].username, "a");
        assert!(store
            .list_by_department(Department::Finance)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_record_login() {
        let store = InMemoryStore::default();
        let user = UserRepository::insert(&store, new_user("a@x.com", "a", Department::Dev))
            .await
            .unwrap();
        let at = Utc::now();

        store.record_login(user.id, at).await.unwrap();

        let reloaded = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(reloaded.last_login, Some(at));
        assert_eq!(reloaded.updated_at, at);
    }

    #[tokio::test]
    async fn test_revoke_keeps_first_revocation_time() {
        let store = InMemoryStore::default();
        RefreshTokenRepository::insert(&store, record(1, "h1")).await.unwrap();

        let first = Utc::now();
        assert!(store.revoke("h1", first).await.unwrap());
        assert!(store.revoke("h1", first + Duration::seconds(5)).await.unwrap());
        assert!(!store.revoke("missing", first).await.unwrap());

        let stored = store.find_by_hash("h1").await.unwrap().unwrap();
        assert_eq!(stored.revoked_at, Some(first));
    }

    #[tokio::test]
    async fn test_revoke_all_only_counts_outstanding_tokens_of_that_user() {
        let store = InMemoryStore::default();
        RefreshTokenRepository::insert(&store, record(1, "h1")).await.unwrap();
        RefreshTokenRepository::insert(&store, record(1, "h2")).await.unwrap();
        RefreshTokenRepository::insert(&store, record(2, "h3")).await.unwrap();
        store.revoke("h2", Utc::now()).await.unwrap();

        assert_eq!(store.revoke_all_for_user(1, Utc::now()).await.unwrap(), 1);
        assert_eq!(store.revoke_all_for_user(1, Utc::now()).await.unwrap(), 0);
        assert!(!store.find_by_hash("h3").await.unwrap().unwrap().is_revoked());
    }
}
