//! HTTP boundary for StudyHub habit tracking.
//!
//! # Responsibility
//! - Expose the habit use-cases of `studyhub_core` as JSON endpoints.
//! - Bootstrap config, logging and storage for the server process.
//!
//! # Invariants
//! - Handlers contain no habit rules; they translate requests into service
//!   calls and service errors into status codes.

use axum::routing::{get, post, put};
use axum::Router;
use log::info;
use tokio::net::TcpListener;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::{ApiError, ServerError};
pub use state::{AppState, Clock};

/// Builds the application router over `state`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/habits",
            get(routes::list_habits).post(routes::create_habit),
        )
        .route(
            "/api/habits/{id}",
            put(routes::update_habit).delete(routes::delete_habit),
        )
        .route("/api/habits/{id}/increment", post(routes::increment_habit))
        .with_state(state)
}

/// Starts logging, opens the habit store and serves until shutdown.
pub async fn run(config: Config) -> Result<(), ServerError> {
    studyhub_core::init_logging(&config.log_level, &config.log_dir.to_string_lossy())?;

    let conn = studyhub_core::db::open_db(&config.db_path)?;
    let app = router(AppState::new(conn));

    let address = config.socket_addr();
    let listener = TcpListener::bind(address).await?;
    info!("event=server_start module=server status=ok address={address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            log::error!("event=shutdown_signal module=server status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                log::error!(
                    "event=shutdown_signal module=server status=error signal=sigterm error={err}"
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("event=shutdown_signal module=server status=ok signal=ctrl_c"),
        _ = terminate => info!("event=shutdown_signal module=server status=ok signal=sigterm"),
    }
}
