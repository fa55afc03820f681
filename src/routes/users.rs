/// User Routes
///
/// Listing, department filtering, detail and self-service registration.

use actix_web::{web, HttpResponse};
use serde::Serialize;

use crate::domain::{DepartmentFilter, PublicUser};
use crate::error::{AppError, NotFoundError};
use crate::routes::ApiResponse;
use crate::user_store::{NewAccount, UserStore};

#[derive(Serialize)]
struct CreatedUser {
    user: PublicUser,
}

/// GET /users
///
/// Every user, as a plain JSON array.
pub async fn list_users(users: web::Data<UserStore>) -> Result<HttpResponse, AppError> {
    let body: Vec<PublicUser> = users.list_all().await?.iter().map(PublicUser::from).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /users/dept/{dept}
///
/// An empty department is still a success; only an unknown key is an error.
///
/// # Errors
/// - 400: `dept` is not one of ALL, DEV, SALES, MANAGER, HR, FINANCE,
///   MARKETING, ADMIN
pub async fn list_users_by_dept(
    path: web::Path<String>,
    users: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let dept = path.into_inner();
    let filter: DepartmentFilter = dept.parse()?;

    let found: Vec<PublicUser> = users
        .list_by_department(filter)
        .await?
        .iter()
        .map(PublicUser::from)
        .collect();

    let message = if found.is_empty() {
        format!("No users found in {} department", filter)
    } else {
        format!("Users in {} department fetched successfully", filter)
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(message, found)))
}

/// GET /users/{id}
///
/// # Errors
/// - 404: no user with that id (only `error` is populated)
pub async fn get_user(
    path: web::Path<i64>,
    users: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let user = users
        .find_by_id(id)
        .await?
        .ok_or(NotFoundError::User(id))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(
        format!("User details for {} fetched successfully", user.username.to_uppercase()),
        PublicUser::from(&user),
    )))
}

/// POST /users/create
///
/// Open to unauthenticated callers. Staff/active flags cannot be set here.
///
/// # Errors
/// - 400: missing/blank/invalid field or a password under 8 characters
/// - 409: email (in any letter case) or username already taken
pub async fn create_user(
    form: web::Json<NewAccount>,
    users: web::Data<UserStore>,
) -> Result<HttpResponse, AppError> {
    let user = users.create(form.into_inner()).await?;

    Ok(HttpResponse::Created().json(ApiResponse::success(
        "User created successfully",
        CreatedUser {
            user: PublicUser::from(&user),
        },
    )))
}
