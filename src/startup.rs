use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use std::net::TcpListener;

use crate::auth::TokenService;
use crate::configuration::Settings;
use crate::error::AppError;
use crate::logger::LoggerMiddleware;
use crate::middleware::{Access, RequireAccess};
use crate::routes::{
    create_user, current_user, get_user, health_check, json_config, list_users,
    list_users_by_dept, login, logout, not_found, path_config, refresh,
};
use crate::store::Repositories;
use crate::user_store::UserStore;

/// Creates the configured `bootstrap_staff` account, if any
pub async fn bootstrap_staff(repositories: &Repositories, settings: &Settings) -> Result<(), AppError> {
    let seed = match &settings.bootstrap_staff {
        Some(seed) => seed.clone(),
        None => return Ok(()),
    };

    let users = UserStore::new(
        repositories.users.clone(),
        settings.security.password_hash_cost,
    );
    if let Some(user) = users.ensure_staff(seed.into()).await? {
        tracing::info!(user_id = user.id, "Bootstrap staff account created");
    }

    Ok(())
}

pub fn run(
    listener: TcpListener,
    repositories: Repositories,
    settings: &Settings,
) -> Result<Server, std::io::Error> {
    let users = web::Data::new(UserStore::new(
        repositories.users,
        settings.security.password_hash_cost,
    ));
    let tokens = web::Data::new(TokenService::new(
        settings.jwt.clone(),
        repositories.refresh_tokens,
    ));
    let listing_access = if settings.application.protect_user_listing {
        Access::Staff
    } else {
        Access::Public
    };

    let server = HttpServer::new(move || {
        let guard = |access: Access| RequireAccess::new(tokens.clone(), access);

        App::new()
            .wrap(LoggerMiddleware)
            // Shared state
            .app_data(json_config())
            .app_data(path_config())
            .app_data(users.clone())
            .app_data(tokens.clone())
            .route("/health_check", web::get().to(health_check))
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .wrap(guard(listing_access))
                            .route(web::get().to(list_users)),
                    )
                    .service(
                        web::resource("/dept/{dept}")
                            .wrap(guard(listing_access))
                            .route(web::get().to(list_users_by_dept)),
                    )
                    .service(
                        web::resource("/create")
                            .wrap(guard(Access::Public))
                            .route(web::post().to(create_user)),
                    )
                    .service(
                        web::resource("/login")
                            .wrap(guard(Access::Public))
                            .route(web::post().to(login)),
                    )
                    .service(
                        web::resource("/refresh")
                            .wrap(guard(Access::Public))
                            .route(web::post().to(refresh)),
                    )
                    .service(
                        web::resource("/logout")
                            .wrap(guard(Access::Authenticated))
                            .route(web::post().to(logout)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(guard(Access::Authenticated))
                            .route(web::get().to(current_user)),
                    )
                    // Must stay last: `{id}` would otherwise shadow the literal paths
                    .service(
                        web::resource("/{id}")
                            .wrap(guard(Access::Public))
                            .route(web::get().to(get_user)),
                    ),
            )
            .default_service(web::route().to(not_found))
    })
    .listen(listener)?
    .run();

    Ok(server)
}
