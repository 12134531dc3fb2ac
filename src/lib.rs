pub mod auth;
pub mod cache;
pub mod config;
pub mod contacts;
pub mod db;
pub mod error;
pub mod users;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, HttpResponse};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::info;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;

pub use auth::{AuthService, RateLimitConfig, RateLimiter};
pub use cache::UserCache;
pub use contacts::ContactsService;
pub use db::{ContactRepository, UserRepository};
pub use users::UserService;

use error::DatabaseError;

/// Health check endpoint handler.
/// Reports database reachability and the active cache mode.
pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let database_ok = sqlx::query("SELECT 1")
        .execute(state.db_pool.as_ref())
        .await
        .is_ok();

    let body = serde_json::json!({
        "status": if database_ok { "healthy" } else { "degraded" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "database": database_ok,
        "cache": state.cache.mode(),
    });

    if database_ok {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::ServiceUnavailable().json(body)
    }
}

/// Application state shared across all components. Built once at startup;
/// everything request-scoped borrows from here instead of reaching for
/// globals.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub db_pool: Arc<PgPool>,
    pub cache: Arc<UserCache>,
    pub auth_service: Arc<AuthService>,
    pub user_service: Arc<UserService>,
    pub contacts_service: Arc<ContactsService>,
    pub rate_limiter: Arc<RateLimiter>,
}

impl AppState {
    /// Startup sequence: cache first, then the database pool, then schema
    /// migrations. A migration failure aborts startup.
    pub async fn new(config: Settings) -> Result<Self> {
        let cache = match &config.redis.url {
            Some(url) => {
                info!("Connecting user cache to redis");
                UserCache::connect(url).await?
            }
            None => {
                info!("No redis url configured, using in-process user cache");
                UserCache::memory()
            }
        };
        let cache = Arc::new(cache);

        let db_pool = PgPoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
            .connect(&config.database.url)
            .await
            .map_err(|e| AppError::Database(DatabaseError::Unavailable(e.to_string())))?;
        let db_pool = Arc::new(db_pool);

        db::run_migrations(&db_pool).await?;

        let user_repo = UserRepository::new(db_pool.clone());
        let contact_repo = ContactRepository::new(db_pool.clone());

        let auth_service = Arc::new(AuthService::new(
            user_repo.clone(),
            cache.clone(),
            config.auth.clone(),
            config.redis.user_cache_ttl_secs,
        ));
        let user_service = Arc::new(UserService::new(user_repo, cache.clone()));
        let contacts_service = Arc::new(ContactsService::new(contact_repo));
        let rate_limiter = Arc::new(RateLimiter::new(RateLimitConfig::default()));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            cache,
            auth_service,
            user_service,
            contacts_service,
            rate_limiter,
        })
    }

    pub async fn shutdown(&self) -> Result<()> {
        // Close database connections
        self.db_pool.close().await;
        Ok(())
    }
}
