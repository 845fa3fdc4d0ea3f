// Parley Server Library
// HTTP surface over the parley-core response facade

pub mod api;
pub mod error;

pub use api::{router, AppState, UserInputQuery};
pub use error::ApiError;

use axum::Router;
use tracing::{error, info};

/// Bind `addr` and serve `app` until Ctrl-C
pub async fn serve(addr: &str, app: Router) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(
        target: "http",
        url = %format!("http://{}", listener.local_addr()?),
        "Parley server ready"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!(target: "http", "Shutting down..."),
        Err(e) => {
            error!(target: "http", error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await
        }
    }
}
