use crate::handlers;
use axum::{
    routing::{get, post},
    Router,
};
use kite_bridge_router::OrderRouter;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub struct ApiServer {
    router: Arc<OrderRouter>,
}

impl ApiServer {
    #[must_use]
    pub const fn new(router: Arc<OrderRouter>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/webhook", post(handlers::webhook))
            .route("/health", get(handlers::health))
            .layer(TraceLayer::new_for_http())
            .with_state(self.router.clone())
    }

    /// Starts the web server listening on the specified address.
    ///
    /// # Errors
    /// Returns an error if the server fails to bind to the address or serve requests.
    pub async fn serve(self, addr: &str) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!("Webhook listening on {}", addr);

        axum::serve(listener, self.router()).await?;

        Ok(())
    }
}
