//! Web server exposing the litigation search over HTTP.

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::Settings;
use crate::services::LitigationService;

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LitigationService>,
}

impl AppState {
    pub fn new(settings: &Settings) -> Self {
        Self {
            service: Arc::new(LitigationService::from_settings(settings)),
        }
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings);
    let app = create_router(state, &settings.allowed_origins);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
