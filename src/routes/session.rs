/// Session Routes
///
/// Login, logout, access-token refresh and the caller's own profile.
/// The access token travels in the JSON body and the Authorization header;
/// the refresh token only ever travels in the `refresh_token` cookie.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{authenticate, Claims, TokenService, REFRESH_TOKEN_COOKIE};
use crate::domain::PublicUser;
use crate::error::{AppError, AuthError, NotFoundError, ValidationError};
use crate::routes::ApiResponse;
use crate::user_store::UserStore;

/// User login request
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Both fields present and non-blank
    fn credentials(&self) -> Result<(&str, &str), ValidationError> {
        let email = self.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
        let password = self.password.as_deref().filter(|p| !p.is_empty());

        match (email, password) {
            (Some(email), Some(password)) => Ok((email, password)),
            _ => Err(ValidationError::MissingCredentials),
        }
    }
}

#[derive(Serialize)]
struct LoginData {
    user: PublicUser,
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

#[derive(Serialize)]
struct AccessTokenData {
    access_token: String,
    token_type: &'static str,
    expires_in: i64,
}

/// POST /users/login
///
/// Returns the user and an access token; the refresh token is set as an
/// HTTP-only cookie.
///
/// # Errors
/// - 400: email or password missing
/// - 401: unknown email, wrong password or inactive account (one message)
pub async fn login(
    form: web::Json<LoginRequest>,
    users: web::Data<UserStore>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let (email, password) = form.credentials()?;

    let mut user = authenticate(&users, email, password).await?;
    let logged_in_at = users.record_login(user.id).await?;
    user.last_login = Some(logged_in_at);
    user.updated_at = logged_in_at;
    let pair = tokens.issue_pair(&user).await?;

    tracing::info!(user_id = user.id, "User logged in successfully");

    Ok(HttpResponse::Ok()
        .cookie(tokens.refresh_cookie(pair.refresh_token))
        .json(ApiResponse::success(
            "User logged in successfully",
            LoginData {
                user: PublicUser::from(&user),
                access_token: pair.access_token,
                token_type: "Bearer",
                expires_in: tokens.config().access_token_expiry,
            },
        )))
}

/// POST /users/logout
///
/// **Requires a valid access token.** Revokes the refresh token in the
/// cookie (if any) and every other outstanding refresh token of the caller,
/// then clears the cookie.
///
/// # Errors
/// - 401: missing or invalid access token (handled by the access guard)
/// - 500: the token store failed
pub async fn logout(
    req: HttpRequest,
    claims: web::ReqData<Claims>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;

    if let Some(cookie) = req.cookie(REFRESH_TOKEN_COOKIE) {
        match tokens.revoke(cookie.value()).await {
            Ok(()) => {}
            Err(AppError::Auth(AuthError::TokenNotFound)) => {
                tracing::warn!(user_id = user_id, "Logout presented an unknown refresh token");
            }
            Err(e) => return Err(e),
        }
    }

    tokens.revoke_all_for_user(user_id).await?;

    tracing::info!(user_id = user_id, "User logged out");

    Ok(HttpResponse::Ok()
        .cookie(tokens.removal_cookie())
        .json(ApiResponse::<()>::message("Logged out successfully")))
}

/// POST /users/refresh
///
/// Exchanges the refresh-token cookie for a new access token.
///
/// # Errors
/// - 401: cookie missing, or token unknown, revoked or expired
pub async fn refresh(
    req: HttpRequest,
    users: web::Data<UserStore>,
    tokens: web::Data<TokenService>,
) -> Result<HttpResponse, AppError> {
    let cookie = req
        .cookie(REFRESH_TOKEN_COOKIE)
        .ok_or(AppError::Auth(AuthError::MissingToken))?;

    let access_token = tokens.refresh_access(cookie.value(), &users).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        "Token refreshed successfully",
        AccessTokenData {
            access_token,
            token_type: "Bearer",
            expires_in: tokens.config().access_token_expiry,
        },
    )))
}

/// GET /users/me
///
/// **Requires a valid access token.**
pub async fn current_user(
    claims: web::ReqData<Claims>,
    users: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let user_id = claims.user_id()?;
    let user = users
        .find_by_id(user_id)
        .await?
        .ok_or(NotFoundError::User(user_id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("User details for {} fetched successfully", user.username.to_uppercase()),
        PublicUser::from(&user),
    )))
}
