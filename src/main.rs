use sqlx::postgres::PgPoolOptions;
use staffdesk::configuration::{get_configuration, StorageBackend};
use staffdesk::error::ConfigError;
use staffdesk::startup::{bootstrap_staff, run};
use staffdesk::store::Repositories;
use staffdesk::telemetry::init_telemetry;
use std::net::TcpListener;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_telemetry("info");

    tracing::info!("Starting application");

    let configuration = get_configuration()
        .map_err(|e| ConfigError::ParseError(e.to_string()))
        .and_then(|settings| settings.validate().map(|()| settings))
        .map_err(|e| {
            tracing::error!("Failed to read configuration: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;
    tracing::info!("Configuration loaded successfully");

    let repositories = match configuration.database.storage {
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on shutdown");
            Repositories::in_memory()
        }
        StorageBackend::Postgres => {
            tracing::info!("Attempting to connect to database");

            let pool = PgPoolOptions::new()
                .max_connections(configuration.database.max_connections)
                .connect(&configuration.database.connection_string())
                .await
                .map_err(|e| {
                    tracing::error!("Failed to create connection pool: {}", e);
                    std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "Database connection error",
                    )
                })?;

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| {
                    tracing::error!("Failed to run migrations: {}", e);
                    std::io::Error::new(std::io::ErrorKind::Other, "Migration error")
                })?;

            tracing::info!("Database connection pool created successfully");
            Repositories::postgres(pool)
        }
    };

    bootstrap_staff(&repositories, &configuration)
        .await
        .map_err(|e| {
            tracing::error!("Failed to create bootstrap staff account: {}", e);
            std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
        })?;

    let address = format!(
        "{}:{}",
        configuration.application.host, configuration.application.port
    );
    let listener = TcpListener::bind(&address)?;
    tracing::info!("Server listening on: {}", address);

    run(listener, repositories, &configuration)?.await
}
