//! Main HTTP Gateway Server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, instrument, warn};

use receiptforge_config::ReceiptForgeConfig;
use receiptforge_understanding::ReceiptAnalyzer;

use crate::{analyze_api, health_api};

/// Application state shared across routes. Read-only after startup.
#[derive(Clone)]
pub struct GatewayState {
    pub analyzer: Arc<ReceiptAnalyzer>,
    pub started_at: Instant,
    /// HTTP body limit, echoed back in 413 responses.
    pub max_body_bytes: usize,
}

impl GatewayState {
    pub fn new(analyzer: Arc<ReceiptAnalyzer>, max_body_bytes: usize) -> Self {
        Self {
            analyzer,
            started_at: Instant::now(),
            max_body_bytes,
        }
    }

    pub fn from_config(config: &ReceiptForgeConfig) -> Result<Self> {
        let analyzer = ReceiptAnalyzer::from_config(&config.vision)?;
        Ok(Self::new(Arc::new(analyzer), config.gateway.max_body_bytes()))
    }
}

/// Build the router with all API routes.
pub fn build_router(state: GatewayState, cors_permissive: bool) -> Router {
    let body_limit = state.max_body_bytes;
    let app = Router::new()
        .route("/api/analyze", post(analyze_api::analyze_receipt))
        .route("/api/health", get(health_api::get_health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if cors_permissive {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Bind `addr` and serve until Ctrl-C.
#[instrument(skip(state))]
pub async fn start_server(addr: SocketAddr, state: GatewayState, cors_permissive: bool) -> Result<()> {
    info!(
        model = %state.analyzer.model(),
        default_credential = state.analyzer.has_default_credential(),
        max_body_bytes = state.max_body_bytes,
        "Starting receipt gateway"
    );
    if !state.analyzer.has_default_credential() {
        warn!("No default Gemini API key configured; callers must send apiKey");
    }

    let app = build_router(state, cors_permissive);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Gateway HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
