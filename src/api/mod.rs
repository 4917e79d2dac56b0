//! HTTP API server for the unzip bot

pub mod health;
pub mod webhooks;

use std::sync::Arc;

use axum::Router;
use secrecy::SecretString;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::handler::UpdateHandler;

/// Shared state for API handlers
pub struct ApiState {
    /// Update handler shared by all requests
    pub handler: Arc<UpdateHandler>,
    /// URL segment that must match for the webhook route
    pub path_secret: SecretString,
    /// Expected `X-Telegram-Bot-Api-Secret-Token` header, if configured
    pub webhook_secret: Option<SecretString>,
}

/// Build the router with all routes
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .nest("/webhook", webhooks::router(state))
        .merge(health::router())
        .layer(TraceLayer::new_for_http())
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server for the given state
    #[must_use]
    pub const fn new(state: Arc<ApiState>, port: u16) -> Self {
        Self { state, port }
    }

    /// Run the API server until shutdown
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, router(self.state))
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

/// Resolve on Ctrl-C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
