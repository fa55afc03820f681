/// User Store
///
/// Owns the rules around user records: field validation, email
/// normalization, uniqueness of email/username and password hashing. The
/// repository underneath only persists what it is given (and backs up the
/// uniqueness checks with its own constraints).

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::auth::{hash_password, validate_password_strength};
use crate::configuration::BootstrapStaffSettings;
use crate::domain::{Department, DepartmentFilter, NewUser, User};
use crate::error::{AppError, ConflictError, ValidationError};
use crate::store::UserRepository;
use crate::validators::{is_valid_email, is_valid_phone, is_valid_username, normalize_email};

/// Self-service registration payload
///
/// Every field is optional at the type level so that a missing field is
/// reported with its own message instead of a generic body error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewAccount {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub phone: Option<String>,
    pub dept: Option<String>,
}

impl From<BootstrapStaffSettings> for NewAccount {
    fn from(seed: BootstrapStaffSettings) -> Self {
        Self {
            email: Some(seed.email),
            username: Some(seed.username),
            password: Some(seed.password),
            ..Self::default()
        }
    }
}

/// Which kind of account a creation path produces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AccountKind {
    /// Public registration; never staff
    Regular,
    /// Operator-created; staff, department defaults to ADMIN
    Staff,
}

#[derive(Clone)]
pub struct UserStore {
    repository: Arc<dyn UserRepository>,
    password_hash_cost: u32,
}

impl UserStore {
    pub fn new(repository: Arc<dyn UserRepository>, password_hash_cost: u32) -> Self {
        Self {
            repository,
            password_hash_cost,
        }
    }

    /// Validates, hashes and stores a new account
    ///
    /// The password is checked first so a weak password is always reported
    /// as such, whatever else is wrong with the payload.
    pub async fn create(&self, account: NewAccount) -> Result<User, AppError> {
        self.create_account(account, AccountKind::Regular).await
    }

    /// Creates a staff account unless the email is already registered
    ///
    /// Returns `None` when the account exists; the existing record is left
    /// untouched.
    pub async fn ensure_staff(&self, account: NewAccount) -> Result<Option<User>, AppError> {
        if let Some(email) = account.email.as_deref() {
            if let Some(existing) = self.find_by_email(email).await? {
                tracing::info!(user_id = existing.id, "Staff account already present");
                return Ok(None);
            }
        }

        self.create_account(account, AccountKind::Staff).await.map(Some)
    }

    async fn create_account(&self, account: NewAccount, kind: AccountKind) -> Result<User, AppError> {
        let password = account
            .password
            .ok_or(ValidationError::MissingField("Password is required"))?;
        validate_password_strength(&password)?;

        let email = account
            .email
            .as_deref()
            .ok_or(ValidationError::MissingField("Email address is required"))
            .and_then(is_valid_email)?;
        let username = account
            .username
            .as_deref()
            .ok_or(ValidationError::MissingField("Username is required"))
            .and_then(is_valid_username)?;
        let phone = is_valid_phone(account.phone.as_deref())?;
        let department = match (account.dept.as_deref(), kind) {
            (Some(dept), _) => dept.parse::<Department>()?,
            (None, AccountKind::Regular) => Department::default(),
            (None, AccountKind::Staff) => Department::Admin,
        };

        if self.repository.find_by_email(&email).await?.is_some() {
            return Err(ConflictError::DuplicateEmail.into());
        }
        if self.repository.find_by_username(&username).await?.is_some() {
            return Err(ConflictError::DuplicateUsername.into());
        }

        let password_hash = hash_password(password, self.password_hash_cost).await?;

        let user = self
            .repository
            .insert(NewUser {
                email,
                username,
                password_hash,
                department,
                phone,
                is_staff: kind == AccountKind::Staff,
                is_active: true,
            })
            .await?;

        tracing::info!(
            user_id = user.id,
            dept = %user.department,
            staff = user.is_staff,
            "User created"
        );
        Ok(user)
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        self.repository.find_by_id(id).await
    }

    /// Looks a user up by email; the input is normalized first.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        self.repository.find_by_email(&normalize_email(email)).await
    }

    pub async fn list_all(&self) -> Result<Vec<User>, AppError> {
        self.repository.list_all().await
    }

    pub async fn list_by_department(&self, filter: DepartmentFilter) -> Result<Vec<User>, AppError> {
        match filter {
            DepartmentFilter::All => self.repository.list_all().await,
            DepartmentFilter::Only(department) => {
                self.repository.list_by_department(department).await
            }
        }
    }

    /// Sets `last_login` (and `updated_at`) and returns the recorded time
    pub async fn record_login(&self, id: i64) -> Result<DateTime<Utc>, AppError> {
        let at = Utc::now();
        self.repository.record_login(id, at).await?;
        Ok(at)
    }
}
