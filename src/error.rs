/// Application error handling
///
/// Every fallible operation in the crate returns `Result<_, AppError>`.
/// Domain errors are grouped in small enums so handlers can match on the
/// failure they care about, and all of them are rendered into the standard
/// response envelope by the `ResponseError` implementation at the bottom of
/// this module.
///
/// Internal failures are logged with a generated error id and answered with
/// a sanitized message; raw error text never reaches the client.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

use crate::routes::ApiResponse;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Validation errors for input data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was not supplied; carries the full message
    MissingField(&'static str),
    /// A supplied field was empty after trimming; carries the full message
    BlankField(&'static str),
    TooLong(&'static str, usize),
    InvalidFormat(&'static str),
    SuspiciousContent(&'static str),
    WeakPassword(usize),
    /// Longer than bcrypt can hash without truncating; carries the byte limit
    PasswordTooLong(usize),
    InvalidChoice(String),
    InvalidDepartment(String),
    MissingCredentials,
    MalformedBody(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingField(msg) | ValidationError::BlankField(msg) => {
                write!(f, "{}", msg)
            }
            ValidationError::TooLong(field, max) => {
                write!(f, "{} is too long (maximum {} characters)", field, max)
            }
            ValidationError::InvalidFormat(field) => write!(f, "{} has invalid format", field),
            ValidationError::SuspiciousContent(field) => {
                write!(f, "{} contains suspicious content", field)
            }
            ValidationError::WeakPassword(min) => {
                write!(f, "Password must be at least {} characters long", min)
            }
            ValidationError::PasswordTooLong(max) => {
                write!(f, "Password must be at most {} bytes long", max)
            }
            ValidationError::InvalidChoice(value) => {
                write!(f, "\"{}\" is not a valid choice.", value)
            }
            ValidationError::InvalidDepartment(dept) => write!(f, "Invalid department: {}", dept),
            ValidationError::MissingCredentials => write!(f, "Email and password are required"),
            ValidationError::MalformedBody(msg) => write!(f, "Malformed request body: {}", msg),
        }
    }
}

impl StdError for ValidationError {}

/// Uniqueness violations on identity fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictError {
    DuplicateEmail,
    DuplicateUsername,
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictError::DuplicateEmail => write!(f, "Email address already exists"),
            ConflictError::DuplicateUsername => write!(f, "Username already exists"),
        }
    }
}

impl StdError for ConflictError {}

/// Lookups that found nothing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotFoundError {
    User(i64),
    Route(String),
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotFoundError::User(id) => write!(f, "User with id {} not found", id),
            NotFoundError::Route(path) => write!(f, "Resource not found: {}", path),
        }
    }
}

impl StdError for NotFoundError {}

/// Database operation errors
#[derive(Debug)]
pub enum DatabaseError {
    QueryExecution(String),
    ConnectionPool(String),
    CorruptRecord(String),
    UnexpectedError(String),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            DatabaseError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            DatabaseError::CorruptRecord(msg) => write!(f, "Corrupt record: {}", msg),
            DatabaseError::UnexpectedError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl StdError for DatabaseError {}

/// Configuration errors
#[derive(Debug)]
pub enum ConfigError {
    InvalidValue(String),
    ParseError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidValue(msg) => write!(f, "Invalid config value: {}", msg),
            ConfigError::ParseError(msg) => write!(f, "Config parse error: {}", msg),
        }
    }
}

impl StdError for ConfigError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    InvalidCredentials,
    MissingToken,
    TokenExpired,
    TokenMalformed,
    TokenBadSignature,
    TokenRevoked,
    TokenNotFound,
    Forbidden,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::MissingToken => write!(f, "Missing authentication token"),
            AuthError::TokenExpired => write!(f, "Token has expired"),
            AuthError::TokenMalformed => write!(f, "Malformed token"),
            AuthError::TokenBadSignature => write!(f, "Token signature is invalid"),
            AuthError::TokenRevoked => write!(f, "Token has been revoked"),
            AuthError::TokenNotFound => write!(f, "Token not recognised"),
            AuthError::Forbidden => write!(f, "Insufficient permissions"),
        }
    }
}

impl StdError for AuthError {}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Validation(ValidationError),
    Conflict(ConflictError),
    Auth(AuthError),
    NotFound(NotFoundError),
    Database(DatabaseError),
    Config(ConfigError),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "{}", e),
            AppError::Conflict(e) => write!(f, "{}", e),
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::NotFound(e) => write!(f, "{}", e),
            AppError::Database(e) => write!(f, "{}", e),
            AppError::Config(e) => write!(f, "{}", e),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

// ============================================================================
// FROM IMPLEMENTATIONS
// ============================================================================

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl From<ConflictError> for AppError {
    fn from(err: ConflictError) -> Self {
        AppError::Conflict(err)
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<NotFoundError> for AppError {
    fn from(err: NotFoundError) -> Self {
        AppError::NotFound(err)
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AppError::Database(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

/// Unique constraint names declared in `migrations/`
const USERS_EMAIL_CONSTRAINT: &str = "users_email_key";
const USERS_USERNAME_CONSTRAINT: &str = "users_username_key";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let Some(db_err) = err.as_database_error() {
            match db_err.constraint() {
                Some(USERS_EMAIL_CONSTRAINT) => {
                    return AppError::Conflict(ConflictError::DuplicateEmail)
                }
                Some(USERS_USERNAME_CONSTRAINT) => {
                    return AppError::Conflict(ConflictError::DuplicateUsername)
                }
                _ => {}
            }
        }

        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                AppError::Database(DatabaseError::ConnectionPool(err.to_string()))
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                AppError::Database(DatabaseError::CorruptRecord(err.to_string()))
            }
            sqlx::Error::Database(_) => {
                AppError::Database(DatabaseError::QueryExecution(err.to_string()))
            }
            _ => AppError::Database(DatabaseError::UnexpectedError(err.to_string())),
        }
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(err: actix_web::error::BlockingError) -> Self {
        AppError::Internal(format!("Blocking task failed: {}", err))
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// Message safe to hand to API callers
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::Conflict(e) => e.to_string(),
            AppError::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            AppError::Auth(AuthError::MissingToken) => {
                "Missing or invalid authorization header".to_string()
            }
            AppError::Auth(AuthError::Forbidden) => "Insufficient permissions".to_string(),
            AppError::Auth(e) => e.to_string(),
            AppError::NotFound(e) => e.to_string(),
            AppError::Database(DatabaseError::ConnectionPool(_)) => {
                "Database service temporarily unavailable".to_string()
            }
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                INTERNAL_MESSAGE.to_string()
            }
        }
    }

    fn log_error(&self, error_id: &str) {
        match self {
            AppError::Validation(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Validation error");
            }
            AppError::Conflict(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Duplicate entry attempt");
            }
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(error_id = error_id, "Invalid credentials attempt");
            }
            AppError::Auth(e) => {
                tracing::warn!(error_id = error_id, error = %e, "Authentication error");
            }
            AppError::NotFound(e) => {
                tracing::info!(error_id = error_id, error = %e, "Resource not found");
            }
            AppError::Database(e) => {
                tracing::error!(error_id = error_id, error = %e, "Database error");
            }
            AppError::Config(e) => {
                tracing::error!(error_id = error_id, error = %e, "Configuration error");
            }
            AppError::Internal(msg) => {
                tracing::error!(error_id = error_id, error = %msg, "Internal error");
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let error_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&error_id);

        HttpResponse::build(self.status_code())
            .json(ApiResponse::<()>::error(self.public_message()))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Auth(AuthError::Forbidden) => StatusCode::FORBIDDEN,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(DatabaseError::ConnectionPool(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
