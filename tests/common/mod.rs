#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc, unreachable_pub)]

use clap::Parser;
use serde_json::{Value, json};
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Once;
use userbase_server::{AppBuilder, storage};
use userbase_server::api::{self, MgmtState};
use userbase_server::config::{Config, StatusMode, TokenPolicy};
use uuid::Uuid;

static INIT: Once = Once::new();

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("userbase_server=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        let _ = tracing_subscriber::fmt().with_env_filter(filter).with_test_writer().try_init();
    });
}

/// Defaults with rate limits high enough to never trip during a test.
pub fn get_test_config() -> Config {
    let mut config = Config::parse_from(["userbase-server"]);
    config.database_url = None;
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.server.mgmt_port = 0;
    config.users.status_mode = StatusMode::Legacy;
    config.users.token_policy = TokenPolicy::Client;
    config.rate_limit.per_second = 10_000;
    config.rate_limit.burst = 10_000;
    config.rate_limit.create_per_second = 10_000;
    config.rate_limit.create_burst = 10_000;
    config.server.trusted_proxies = Vec::new();
    config
}

/// Connects to `DATABASE_URL` and applies migrations. Returns `None` when the
/// variable is unset so database-backed tests can be skipped on machines without Postgres.
pub async fn get_test_pool() -> Option<PgPool> {
    setup_tracing();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        tracing::warn!("DATABASE_URL not set, skipping Postgres-backed test");
        return None;
    };

    let pool = storage::init_pool(&database_url, 5).await.expect("Failed to connect to DB. Is Postgres running?");
    userbase_server::run_migrations(&pool).await.expect("Failed to run migrations");
    Some(pool)
}

pub struct TestApp {
    pub server_url: String,
    pub mgmt_url: String,
    pub client: reqwest::Client,
}

pub struct TestUser {
    pub user_id: Uuid,
    pub token: String,
    pub email: String,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with_config(get_test_config()).await
    }

    pub async fn spawn_with_config(config: Config) -> Self {
        Self::spawn_with_builder(AppBuilder::new(config.clone()), config).await
    }

    pub async fn spawn_with_database(pool: PgPool) -> Self {
        let config = get_test_config();
        Self::spawn_with_builder(AppBuilder::new(config.clone()).with_database(pool), config).await
    }

    async fn spawn_with_builder(builder: AppBuilder, config: Config) -> Self {
        setup_tracing();

        let app = builder.build();
        let app_router = api::app_router(config, app.services);
        let mgmt_app = api::mgmt_router(MgmtState { health_service: app.health_service });

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mgmt_listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mgmt_addr = mgmt_listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app_router.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });
        tokio::spawn(async move {
            axum::serve(mgmt_listener, mgmt_app.into_make_service_with_connect_info::<SocketAddr>()).await.unwrap();
        });

        Self {
            server_url: format!("http://{addr}"),
            mgmt_url: format!("http://{mgmt_addr}"),
            client: reqwest::Client::new(),
        }
    }

    pub fn users_url(&self) -> String {
        format!("{}/api/v1/users", self.server_url)
    }

    pub async fn create_user(&self, payload: &Value) -> reqwest::Response {
        self.client.post(self.users_url()).json(payload).send().await.unwrap()
    }

    /// Registers a user with a unique email and token, asserting success.
    pub async fn register_user(&self, name: &str) -> TestUser {
        let run_id = Uuid::new_v4().simple().to_string();
        let email = format!("{name}_{run_id}@example.com");
        let token = format!("token_{run_id}");

        let resp = self.create_user(&user_payload(name, &email, "password12345", &token)).await;
        assert!(resp.status().is_success(), "registration failed: {}", resp.status());

        let body: Value = resp.json().await.unwrap();
        let user_id = body["id"].as_str().unwrap().parse().unwrap();
        TestUser { user_id, token: body["token"].as_str().unwrap().to_string(), email }
    }

    pub async fn get_authed(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.server_url, path))
            .header("Authorization", format!("Bearer {token}"))
            .send()
            .await
            .unwrap()
    }
}

pub fn user_payload(name: &str, email: &str, password: &str, token: &str) -> Value {
    json!({
        "user": {
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password,
            "token": token
        }
    })
}
