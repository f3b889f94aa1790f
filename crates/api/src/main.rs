use std::net::SocketAddr;
use std::sync::Arc;

use grantdesk_api::config::ServerConfig;
use grantdesk_api::router::build_app_router;
use grantdesk_api::state::AppState;
use grantdesk_core::identity::{IdentityDirectory, StaticDirectory};
use grantdesk_db::identity::PgIdentityDirectory;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "grantdesk_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = grantdesk_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    grantdesk_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    grantdesk_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Identity registry ---
    let directory: Arc<dyn IdentityDirectory> = match &config.identity_database_url {
        Some(url) => {
            let identity_pool = grantdesk_db::create_identity_pool(url)
                .await
                .expect("Failed to connect to identity registry");
            tracing::info!("Identity registry connection pool created");
            Arc::new(PgIdentityDirectory::new(identity_pool))
        }
        None => {
            tracing::warn!(
                "IDENTITY_DATABASE_URL not set, using an empty in-memory identity directory"
            );
            Arc::new(StaticDirectory::new())
        }
    };

    // --- Media root ---
    tokio::fs::create_dir_all(&config.media_root)
        .await
        .expect("Failed to create MEDIA_ROOT");

    // --- Background tasks ---
    let cancel = CancellationToken::new();
    let cleanup_handle = tokio::spawn(grantdesk_api::background::session_cleanup::run(
        pool.clone(),
        cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        directory,
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    cancel.cancel();
    if let Err(e) = cleanup_handle.await {
        tracing::error!(error = %e, "Session cleanup task panicked");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM (on Unix) to start graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
