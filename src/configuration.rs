use config::ConfigError;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub jwt: JwtSettings,
    #[serde(default)]
    pub security: SecuritySettings,
    /// Staff account created at startup if its email is not yet registered
    #[serde(default)]
    pub bootstrap_staff: Option<BootstrapStaffSettings>,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub port: u16,
    /// Require a staff access token for the user listing endpoints
    #[serde(default)]
    pub protect_user_listing: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Which repository implementation the server runs on
#[derive(serde::Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Postgres,
    Memory,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    #[serde(default)]
    pub storage: StorageBackend,
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

/// JWT and refresh-token settings
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    pub secret: String,
    pub access_token_expiry: i64,   // seconds (e.g., 900 for 15 minutes)
    pub refresh_token_expiry: i64,  // seconds (e.g., 86400 for 24 hours)
    pub issuer: String,
    /// Mark the refresh-token cookie `Secure`
    #[serde(default = "default_true")]
    pub secure_cookies: bool,
}

fn default_true() -> bool {
    true
}

#[derive(serde::Deserialize, Clone)]
pub struct SecuritySettings {
    /// bcrypt work factor
    #[serde(default = "default_hash_cost")]
    pub password_hash_cost: u32,
}

fn default_hash_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            password_hash_cost: default_hash_cost(),
        }
    }
}

/// Seed for the operator's staff account
///
/// Keep the password out of `configuration.yaml`; set it with
/// `APP_BOOTSTRAP_STAFF__PASSWORD`.
#[derive(serde::Deserialize, Clone)]
pub struct BootstrapStaffSettings {
    pub email: String,
    pub username: String,
    pub password: String,
}

/// Shortest accepted HMAC secret, in bytes
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

/// Work factors bcrypt accepts
const HASH_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

impl Settings {
    /// Rejects values that deserialize fine but cannot run a server.
    pub fn validate(&self) -> Result<(), crate::error::ConfigError> {
        use crate::error::ConfigError::InvalidValue;

        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(InvalidValue(format!(
                "jwt.secret must be at least {} bytes",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        if self.jwt.access_token_expiry <= 0 {
            return Err(InvalidValue("jwt.access_token_expiry must be positive".into()));
        }
        if self.jwt.refresh_token_expiry <= 0 {
            return Err(InvalidValue("jwt.refresh_token_expiry must be positive".into()));
        }
        if !HASH_COST_RANGE.contains(&self.security.password_hash_cost) {
            return Err(InvalidValue(format!(
                "security.password_hash_cost must be between {} and {}",
                HASH_COST_RANGE.start(),
                HASH_COST_RANGE.end()
            )));
        }
        if self.database.storage == StorageBackend::Postgres && self.database.max_connections == 0 {
            return Err(InvalidValue("database.max_connections must be positive".into()));
        }
        Ok(())
    }
}

/// Loads `configuration.yaml` (optional) overlaid with `APP_*` environment
/// variables, e.g. `APP_JWT__SECRET` or `APP_DATABASE__STORAGE=memory`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;
    settings.try_deserialize::<Settings>()
}
