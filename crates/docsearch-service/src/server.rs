//! HTTP server setup.
//!
//! | Method     | Path          | Description                    |
//! |------------|---------------|--------------------------------|
//! | `GET/POST` | `/`           | Field-scoped match search      |
//! | `GET`      | `/help`       | Usage text                     |
//! | `GET`      | `/robots.txt` | Disallow all crawlers          |
//! | `GET`      | `/health`     | Health check (returns version) |

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tracing::info;

use docsearch_index::DocumentSearcher;

use crate::handlers::{handle_health, handle_help, handle_robots, handle_search, AppState};

/// Build the application router.
pub fn router(searcher: Arc<DocumentSearcher>, default_limit: usize) -> Router {
    let state = AppState {
        searcher,
        default_limit,
    };

    Router::new()
        .route("/", get(handle_search).post(handle_search))
        .route("/help", get(handle_help))
        .route("/robots.txt", get(handle_robots))
        .route("/health", get(handle_health))
        .with_state(state)
}

/// Run the HTTP server until the process is stopped.
pub async fn run_server(
    addr: SocketAddr,
    searcher: Arc<DocumentSearcher>,
    default_limit: usize,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    run_server_with_shutdown(addr, searcher, default_limit, std::future::pending()).await
}

/// Run the HTTP server with graceful shutdown support.
///
/// Accepts a shutdown signal future that, when resolved, triggers graceful shutdown.
pub async fn run_server_with_shutdown<F>(
    addr: SocketAddr,
    searcher: Arc<DocumentSearcher>,
    default_limit: usize,
    shutdown_signal: F,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    info!("Starting HTTP server on {}", addr);

    let app = router(searcher, default_limit);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(addr = %listener.local_addr()?, "HTTP server ready");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await?;

    info!("HTTP server shutdown complete");
    Ok(())
}
