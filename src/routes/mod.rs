mod health_check;
mod session;
mod users;

pub use health_check::health_check;
pub use session::{current_user, login, logout, refresh, LoginRequest};
pub use users::{create_user, get_user, list_users, list_users_by_dept};

use actix_web::{web, HttpRequest, HttpResponse};
use serde::Serialize;

use crate::error::{AppError, NotFoundError, ValidationError};

/// Response envelope shared by every non-list endpoint
///
/// Absent fields are left out of the JSON entirely.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            data: None,
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// JSON extractor config: body errors are answered in the envelope
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        AppError::from(ValidationError::MalformedBody(err.to_string())).into()
    })
}

/// Path extractor config: an unparseable segment (e.g. `/users/abc`) is a
/// 404, not a 400
pub fn path_config() -> web::PathConfig {
    web::PathConfig::default().error_handler(|_err, req| {
        AppError::from(NotFoundError::Route(req.path().to_string())).into()
    })
}

/// Fallback for unmatched routes
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(NotFoundError::Route(req.path().to_string()).into())
}
