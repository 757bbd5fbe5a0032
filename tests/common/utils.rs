use secrecy::ExposeSecret;
use serde_json::{json, Value};
use sqlx::{PgPool, PgConnection, Connection, Executor};
use std::collections::HashMap;
use std::net::TcpListener;
use uuid::Uuid;
use once_cell::sync::Lazy;
use reqwest::Client;
use actix_web::{web, App, HttpResponse, HttpServer};

use xyyl_backend::run;
use xyyl_backend::config::settings::{get_config, DatabaseSettings, Settings};
use xyyl_backend::services::redis_service::RedisService;
use xyyl_backend::telemetry::{get_subscriber, init_subscriber};

pub const TEST_PASSWORD: &str = "testpass123";

// Ensure that the `tracing` stack is only initialised once using `once_cell`
static TRACING: Lazy<()> = Lazy::new(|| {
    let default_filter_level = "info".to_string();
    let subscriber_name = "test".to_string();

    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::stdout
        );
        init_subscriber(subscriber);
    } else {
        let subscriber = get_subscriber(
            subscriber_name,
            default_filter_level,
            std::io::sink
        );
        init_subscriber(subscriber);
    }
});

pub struct TestApp {
    pub address: String,
    pub db_pool: PgPool,
    pub redis: RedisService,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn the app with the WeChat API pointed at `wechat_base_url`.
pub async fn spawn_app_with_wechat(wechat_base_url: String) -> TestApp {
    spawn_app_with(move |configuration| {
        configuration.wechat.api_base_url = wechat_base_url;
        configuration.wechat.app_id = "wx-test-app".to_string();
    })
    .await
}

async fn spawn_app_with<F>(customize: F) -> TestApp
where
    F: FnOnce(&mut Settings),
{
    // The first time `initialize` is invoked the code in `TRACING` is executed.
    // All other invocations will instead skip execution.
    Lazy::force(&TRACING);

    let listener = TcpListener::bind("127.0.0.1:0")
        .expect("Failed to bind random port");
    // Get port assigned by the OS
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    let mut configuration = get_config().expect("Failed to read configuration.");
    configuration.database.db_name = Uuid::new_v4().to_string();
    configuration.database.db_url = None;
    customize(&mut configuration);

    let connection_pool = configure_db(&configuration.database).await;
    let redis = RedisService::open(&configuration.redis);

    let server = run(
        listener,
        connection_pool.clone(),
        &configuration,
        redis.clone(),
    )
        .expect("Failed to bind address");
    // Launch the server as a background task
    let _ = tokio::spawn(server);

    TestApp {
        address,
        db_pool: connection_pool,
        redis,
    }
}

pub async fn configure_db(config: &DatabaseSettings) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect(
            &config.connection_string_without_db()
        )
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(format!(r#"CREATE DATABASE "{}";"#, config.db_name).as_str())
        .await
        .expect("Failed to create database.");

    // Migrate database
    let connection_pool = PgPool::connect(config.connection_string().expose_secret())
        .await
        .expect("Failed to connect to Postgres.");
    sqlx::migrate!("./migrations")
        .run(&connection_pool)
        .await
        .expect("Failed to migrate the database");

    connection_pool
}

pub struct TestUser {
    pub username: String,
    pub email: String,
    pub access: String,
    pub refresh: String,
}

/// Register a fresh user and log in with it.
pub async fn create_test_user_and_login(app: &TestApp) -> TestUser {
    let client = Client::new();
    let username = format!("user_{}", &Uuid::new_v4().simple().to_string()[..12]);
    let email = format!("{}@example.com", username);

    let register_response = client
        .post(app.url("/api/users/"))
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD,
            "email": email
        }))
        .send()
        .await
        .expect("Failed to register user.");
    assert_eq!(201, register_response.status().as_u16(), "Registration should succeed");

    let login_response = client
        .post(app.url("/api/auth/login/"))
        .json(&json!({
            "username": username,
            "password": TEST_PASSWORD
        }))
        .send()
        .await
        .expect("Failed to execute login request.");
    assert_eq!(200, login_response.status().as_u16(), "Login should succeed");

    let tokens: Value = login_response.json().await.expect("Failed to parse login response");
    TestUser {
        username,
        email,
        access: tokens["access"].as_str().expect("No access token in response").to_string(),
        refresh: tokens["refresh"].as_str().expect("No refresh token in response").to_string(),
    }
}

/// Whether the configured Redis answers, for tests that need revocation.
pub async fn redis_available(redis: &RedisService) -> bool {
    let Some(client) = &redis.client else {
        return false;
    };
    match client.get_multiplexed_async_connection().await {
        Ok(mut conn) => redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .is_ok(),
        Err(_) => false,
    }
}

/// Serve a stand-in for WeChat's `jscode2session`.
///
/// `code-<x>` resolves to openid `openid-<x>`, `invalid` yields errcode 40029
/// and `no-openid` a success payload without an openid.
pub fn spawn_fake_wechat() -> String {
    async fn jscode2session(query: web::Query<HashMap<String, String>>) -> HttpResponse {
        let code = query.get("js_code").cloned().unwrap_or_default();
        let body = match code.as_str() {
            "invalid" => json!({ "errcode": 40029, "errmsg": "invalid code" }),
            "no-openid" => json!({ "session_key": "k" }),
            other => json!({
                "openid": format!("openid-{}", other.trim_start_matches("code-")),
                "session_key": "session-key"
            }),
        };
        // WeChat answers with text/plain
        HttpResponse::Ok()
            .content_type("text/plain")
            .body(body.to_string())
    }

    let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let server = HttpServer::new(|| {
        App::new().route("/sns/jscode2session", web::get().to(jscode2session))
    })
    .workers(1)
    .listen(listener)
    .expect("Failed to bind fake WeChat server")
    .run();
    let _ = tokio::spawn(server);

    format!("http://127.0.0.1:{}", port)
}
