#![allow(dead_code)]

use actix_web::{test, web, App};
use contacthub_server::config::{
    AuthConfig, CorsConfig, DatabaseConfig, RedisConfig, ServerConfig,
};
use contacthub_server::{auth, AppState, Settings};
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret";

/// Builds application state against the database named by `DATABASE_URL`
/// (running migrations on the way up), or `None` when no database is
/// available so the caller can skip.
pub async fn try_state() -> Option<web::Data<AppState>> {
    let Ok(db_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database-backed test");
        return None;
    };

    let settings = Settings {
        environment: "test".to_string(),
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        database: DatabaseConfig {
            url: db_url,
            max_connections: 5,
            acquire_timeout_secs: 3,
        },
        redis: RedisConfig {
            url: std::env::var("REDIS_URL").ok(),
            user_cache_ttl_secs: 60,
        },
        auth: AuthConfig {
            jwt_secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_secs: 3600,
            email_token_expiry_secs: 3600,
        },
        cors: CorsConfig {
            enabled: false,
            allow_any_origin: false,
            allowed_origins: vec![],
            max_age: 3600,
        },
    };

    let state = AppState::new(settings)
        .await
        .expect("failed to initialize test application state");
    Some(web::Data::new(state))
}

pub fn unique_email(prefix: &str) -> String {
    format!("{}+{}@example.com", prefix, Uuid::new_v4().simple())
}

pub fn unique_username(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", prefix, &suffix[..12])
}

/// Registers a fresh user over the API and logs in, returning the user id
/// and a bearer token.
pub async fn register_and_login(
    state: &web::Data<AppState>,
    email: &str,
    password: &str,
) -> (Uuid, String) {
    let app = test::init_service(
        App::new()
            .app_data(state.clone())
            .route("/api/auth/register", web::post().to(auth::handlers::register))
            .route("/api/auth/login", web::post().to(auth::handlers::login)),
    )
    .await;

    let register_response = test::TestRequest::post()
        .uri("/api/auth/register")
        .set_json(serde_json::json!({
            "username": unique_username("user"),
            "email": email,
            "password": password,
        }))
        .send_request(&app)
        .await;
    assert_eq!(register_response.status(), 201, "registration failed");
    let body: serde_json::Value = test::read_body_json(register_response).await;
    let user_id = Uuid::parse_str(body["id"].as_str().unwrap()).unwrap();

    let login_response = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(serde_json::json!({
            "email": email,
            "password": password,
        }))
        .send_request(&app)
        .await;
    assert_eq!(login_response.status(), 200, "login failed");
    let body: serde_json::Value = test::read_body_json(login_response).await;
    let token = body["access_token"].as_str().unwrap().to_string();

    (user_id, token)
}
