use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use contacthub_server::{auth, contacts, health_check, users, AppError, AppState, Settings};
use dotenv::dotenv;
use std::net::TcpListener;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[actix_web::main]
async fn main() -> contacthub_server::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();

    // Load configuration
    let config = Settings::new()?;
    info!("Configuration loaded successfully");

    info!("Starting server at {}:{}", config.server.host, config.server.port);

    // Initialize application state: cache, database pool, migrations
    let state = AppState::new(config.clone()).await?;
    let state = web::Data::new(state);

    // Periodically drop idle rate-limiter windows
    let maintenance_state = state.clone();
    tokio::spawn(async move {
        loop {
            maintenance_state.rate_limiter.cleanup().await;
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
    });

    // Create and bind TCP listener
    let listener = TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))?;

    info!(
        "API server initialized and ready to accept connections at http://{}:{}",
        config.server.host, config.server.port
    );

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if config.cors.enabled {
            let cors_config = Cors::default();

            if config.cors.allow_any_origin {
                cors_config
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(config.cors.max_age as usize)
            } else {
                let mut restricted = cors_config
                    .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                    .allowed_headers(vec!["Authorization", "Content-Type"])
                    .supports_credentials()
                    .max_age(config.cors.max_age as usize);
                for origin in &config.cors.allowed_origins {
                    restricted = restricted.allowed_origin(origin);
                }
                restricted
            }
        } else {
            // CORS disabled - use most restrictive settings
            Cors::default()
        };

        App::new()
            .wrap(cors)
            .app_data(state.clone())
            .route("/health", web::get().to(health_check))
            .route("/api/auth/register", web::post().to(auth::handlers::register))
            .route("/api/auth/login", web::post().to(auth::handlers::login))
            .route(
                "/api/auth/confirm-email/{token}",
                web::get().to(auth::handlers::confirm_email),
            )
            .route(
                "/api/auth/request-password-reset",
                web::post().to(auth::handlers::request_password_reset),
            )
            .route(
                "/api/auth/reset-password",
                web::post().to(auth::handlers::reset_password),
            )
            .route("/api/users/me", web::get().to(users::handlers::me))
            .route(
                "/api/users/me/avatar",
                web::put().to(users::handlers::update_avatar),
            )
            .route("/api/contacts", web::post().to(contacts::handlers::create))
            .route("/api/contacts", web::get().to(contacts::handlers::list))
            // Literal segments must be registered before the {id} routes.
            .route(
                "/api/contacts/search",
                web::get().to(contacts::handlers::search),
            )
            .route(
                "/api/contacts/birthdays",
                web::get().to(contacts::handlers::upcoming_birthdays),
            )
            .route("/api/contacts/{id}", web::get().to(contacts::handlers::get))
            .route("/api/contacts/{id}", web::put().to(contacts::handlers::update))
            .route(
                "/api/contacts/{id}",
                web::delete().to(contacts::handlers::delete),
            )
    })
    .listen(listener)?
    .workers(config.server.workers as usize)
    .run()
    .await
    .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(())
}
