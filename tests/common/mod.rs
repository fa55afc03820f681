#![allow(dead_code)]

use reqwest::Response;
use serde_json::{json, Value};
use std::net::TcpListener;

use staffdesk::auth::hash_password;
use staffdesk::configuration::{
    ApplicationSettings, DatabaseSettings, JwtSettings, SecuritySettings, Settings,
    StorageBackend,
};
use staffdesk::domain::{Department, NewUser, User};
use staffdesk::startup::run;
use staffdesk::store::{Repositories, UserRepository};

pub const TEST_PASSWORD: &str = "correct-horse-battery";
/// Cheapest cost bcrypt accepts, keeps the suite fast
const TEST_HASH_COST: u32 = 4;

pub struct TestApp {
    pub address: String,
    pub repositories: Repositories,
    pub client: reqwest::Client,
}

pub fn test_settings(protect_user_listing: bool) -> Settings {
    Settings {
        application: ApplicationSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            protect_user_listing,
        },
        database: DatabaseSettings {
            storage: StorageBackend::Memory,
            username: "postgres".to_string(),
            password: "password".to_string(),
            port: 5432,
            host: "localhost".to_string(),
            database_name: "staffdesk".to_string(),
            max_connections: 1,
        },
        jwt: JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 86400,
            issuer: "staffdesk".to_string(),
            secure_cookies: true,
        },
        security: SecuritySettings {
            password_hash_cost: TEST_HASH_COST,
        },
        bootstrap_staff: None,
    }
}

pub fn spawn_app() -> TestApp {
    spawn_app_with(test_settings(false))
}

pub fn spawn_app_with(settings: Settings) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let repositories = Repositories::in_memory();
    let server =
        run(listener, repositories.clone(), &settings).expect("Failed to bind address");
    let _ = tokio::spawn(server);

    TestApp {
        address,
        repositories,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn create_user(&self, body: &Value) -> Response {
        self.client
            .post(self.url("/users/create"))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Registers `username` with `TEST_PASSWORD` and returns the stored user
    pub async fn register(&self, email: &str, username: &str, dept: &str) -> Value {
        let response = self
            .create_user(&json!({
                "email": email,
                "username": username,
                "password": TEST_PASSWORD,
                "dept": dept,
            }))
            .await;
        assert_eq!(201, response.status().as_u16());

        let body: Value = response.json().await.expect("Failed to parse response");
        body["data"]["user"].clone()
    }

    /// Inserts a staff account directly; self-signup cannot create one
    pub async fn insert_staff(&self, email: &str, username: &str) -> User {
        self.insert_user(email, username, true, true).await
    }

    /// Inserts a deactivated account directly
    pub async fn insert_inactive(&self, email: &str, username: &str) -> User {
        self.insert_user(email, username, false, false).await
    }

    async fn insert_user(&self, email: &str, username: &str, is_staff: bool, is_active: bool) -> User {
        let password_hash = hash_password(TEST_PASSWORD.to_string(), TEST_HASH_COST)
            .await
            .expect("Failed to hash password");

        self.repositories
            .users
            .insert(NewUser {
                email: email.to_string(),
                username: username.to_string(),
                password_hash,
                department: if is_staff { Department::Admin } else { Department::Dev },
                phone: None,
                is_staff,
                is_active,
            })
            .await
            .expect("Failed to insert user")
    }

    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.client
            .post(self.url("/users/login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .expect("Failed to execute request.")
    }

    /// Logs in and returns `(access_token, refresh_token)`
    pub async fn login_tokens(&self, email: &str) -> (String, String) {
        let response = self.login(email, TEST_PASSWORD).await;
        assert_eq!(200, response.status().as_u16());

        let refresh_token =
            refresh_cookie_value(&response).expect("Login should set the refresh cookie");
        let body: Value = response.json().await.expect("Failed to parse response");
        let access_token = body["data"]["access_token"]
            .as_str()
            .expect("Login should return an access token")
            .to_string();

        (access_token, refresh_token)
    }

    pub async fn refresh(&self, refresh_token: &str) -> Response {
        self.client
            .post(self.url("/users/refresh"))
            .header("Cookie", format!("refresh_token={}", refresh_token))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

/// Raw `Set-Cookie` header for the refresh token, if the response set one
pub fn refresh_set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("refresh_token="))
        .map(str::to_string)
}

pub fn refresh_cookie_value(response: &Response) -> Option<String> {
    refresh_set_cookie(response).map(|header| {
        header
            .trim_start_matches("refresh_token=")
            .split(';')
            .next()
            .unwrap_or_default()
            .to_string()
    })
}
