//! Dashboard API server binary.
//!
//! ## Usage
//! ```bash
//! SANJ_DB_PATH=./sanj.db SANJ_PORT=8080 dashboard-api
//! RUST_LOG=debug dashboard-api
//! ```

use sanj_dashboard_api::{router, ApiConfig, AppState};
use sanj_db::Database;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Sanj dashboard API...");

    // Load configuration
    let config = ApiConfig::load()?;
    info!(
        db_path = %config.db_path.display(),
        port = config.port,
        "Configuration loaded"
    );

    // Open database (runs migrations)
    let db = Database::new(config.db_config()).await?;

    let addr = config.socket_addr();
    let app = router(AppState::new(db.clone(), config));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber.
///
/// Default filter: `info,sanj=debug,sqlx=warn`; override with `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sanj=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
