//! Triage board server - main entry point.
//!
//! Starts the Actix-web server with configured routes and middleware.

use std::sync::Arc;

use actix_cors::Cors;
use actix_web::http::header::{self, HeaderName};
use actix_web::{App, HttpServer, web};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use triage_board_lib::api;
use triage_board_lib::auth::AdminKey;
use triage_board_lib::config::Config;
use triage_board_lib::db::DbPool;
use triage_board_lib::middleware::RequestLogger;
use triage_board_lib::services::storage::{BlobStore, build_blob_store};

/// Perform health check (for Docker healthcheck).
fn health_check() -> bool {
    // Simple check - just verify we can load config
    Config::from_env().is_ok()
}

fn cors(is_development: bool) -> Cors {
    let admin_key = HeaderName::from_static("x-admin-key");
    let cors = if is_development {
        // Permissive CORS for the local frontend dev server
        Cors::default()
            .allowed_origin("http://localhost:3000")
            .allowed_origin("http://127.0.0.1:3000")
            .supports_credentials()
    } else {
        // Same-origin only in production
        Cors::default()
    };
    cors.allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allowed_headers(vec![
            header::AUTHORIZATION,
            header::ACCEPT,
            header::CONTENT_TYPE,
            admin_key,
        ])
        .max_age(3600)
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Check for --health-check flag (used by Docker HEALTHCHECK)
    if std::env::args().any(|arg| arg == "--health-check") {
        dotenvy::dotenv().ok();
        std::process::exit(if health_check() { 0 } else { 1 });
    }

    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        std::process::exit(1);
    }

    // Load configuration
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            error!("");
            error!("Please check your environment variables:");
            error!("  - TRIAGE_ENV must be set to 'development' or 'production'");
            error!("  - In production, DATABASE_URL and TRIAGE_SESSION_SECRET must be set");
            error!("  - In production, values must not match development defaults");
            std::process::exit(1);
        }
    };

    info!("========================================");
    info!("  Triage Board Server");
    info!("  Environment: {}", config.environment);
    info!("========================================");

    if config.is_development() {
        warn!("Running in DEVELOPMENT mode - do not use in production!");
        info!("Using development defaults for DATABASE_URL, session secret and admin key");
    }

    // Initialize database
    let pool = match DbPool::new(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };
    info!("Database connection established");

    if let Err(e) = pool.run_migrations().await {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }
    info!("Database migrations complete");

    // Attachment blob store
    let store: Arc<dyn BlobStore> = match build_blob_store(&config.storage).await {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to initialize attachment storage: {}", e);
            std::process::exit(1);
        }
    };
    info!("Attachment storage ready ({:?})", config.storage.backend);

    // Prepare shared state
    let bind_address = config.bind_address();
    let admin_key = AdminKey::new(config.admin_key.clone());
    if !admin_key.is_configured() {
        info!("No bootstrap admin key configured");
    }
    let max_upload_size = config.max_upload_size;
    let is_development = config.is_development();
    info!(
        "Upload limit: {}MB per request",
        max_upload_size / 1024 / 1024
    );

    let worker_count = if is_development {
        info!(
            "Starting server at http://{} (4 workers - development mode)",
            bind_address
        );
        4
    } else {
        let cpus = num_cpus::get();
        info!(
            "Starting server at http://{} ({} workers)",
            bind_address, cpus
        );
        cpus
    };

    let config = web::Data::new(config);
    let pool = web::Data::new(pool);
    let admin_key = web::Data::new(admin_key);
    let store = web::Data::new(store);

    // Start HTTP server
    let server = HttpServer::new(move || {
        App::new()
            // CORS must be registered before other middleware
            .wrap(cors(is_development))
            .wrap(RequestLogger)
            // Shared state
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(admin_key.clone())
            .app_data(store.clone())
            // Extractor error mapping
            .app_data(api::json_config())
            .app_data(api::query_config())
            .app_data(api::path_config())
            .app_data(web::PayloadConfig::new(max_upload_size))
            .service(web::scope("/api/v1").configure(api::configure_routes))
    });

    server
        .workers(worker_count)
        .bind(&bind_address)?
        .run()
        .await
}
