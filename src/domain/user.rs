/// User records
///
/// `User` is the stored record and deliberately does not implement
/// `Serialize`; the only way a user leaves the process is through
/// `PublicUser`, which is built field by field and has no hash field.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::Department;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub department: Department,
    pub phone: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated user ready to be inserted
///
/// `email` is already normalized and `password_hash` already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password_hash: String,
    pub department: Department,
    pub phone: Option<String>,
    pub is_staff: bool,
    pub is_active: bool,
}

/// Outward shape of a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub phone: Option<String>,
    pub dept: Department,
    pub is_staff: bool,
    pub is_active: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            phone: user.phone.clone(),
            dept: user.department,
            is_staff: user.is_staff,
            is_active: user.is_active,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        PublicUser::from(&user)
    }
}
