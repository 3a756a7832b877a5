//! HTTP service: viewer page, edition lookup and PDF proxy.
//!
//! # Routes
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `GET` | `/` | [`crate::viewer::index`] |
//! | `GET` | `/api/edition` | [`edition`] |
//! | `GET` | `/api/pdf-proxy?url=` | [`crate::proxy::pdf_proxy`] |
//!
//! Every request resolves afresh; nothing is cached between requests.

use crate::config::EditionConfig;
use crate::models::NewspaperResult;
use crate::prober::HttpProber;
use crate::proxy::{self, PROXY_ROUTE};
use crate::resolver::EditionResolver;
use crate::viewer;
use axum::{Json, Router, extract::State, routing::get};
use std::error::Error;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};
use url::Origin;

pub const EDITION_ROUTE: &str = "/api/edition";

/// Shared, read-only state of the service.
#[derive(Debug, Clone)]
pub struct AppState {
    pub resolver: Arc<EditionResolver<HttpProber>>,
    /// Client used by the proxy for full document downloads.
    pub client: reqwest::Client,
    /// The only origin the proxy relays to.
    pub publisher_origin: Origin,
}

impl AppState {
    pub fn from_config(config: EditionConfig) -> Result<Self, Box<dyn Error>> {
        let publisher_origin = config.publisher_origin()?;
        let prober = HttpProber::from_config(&config)?;
        let client = proxy::proxy_client(&config, publisher_origin.clone())?;

        Ok(Self {
            resolver: Arc::new(EditionResolver::new(config, prober)),
            client,
            publisher_origin,
        })
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(viewer::index))
        .route(EDITION_ROUTE, get(edition))
        .route(PROXY_ROUTE, get(proxy::pdf_proxy))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolve the current edition and return the viewer record.
///
/// Always answers `200 OK`; the outcome is in the `success` flag.
#[instrument(level = "info", skip_all)]
pub async fn edition(State(state): State<AppState>) -> Json<NewspaperResult> {
    Json(state.resolver.resolve_now().await.into())
}

/// Bind to `config.bind` and serve until Ctrl-C.
#[instrument(level = "info", skip_all, fields(bind = %config.bind))]
pub async fn serve(config: EditionConfig) -> Result<(), Box<dyn Error>> {
    let bind = config.bind.clone();
    let state = AppState::from_config(config)?;

    let listener = TcpListener::bind(&bind).await?;
    info!(addr = %listener.local_addr()?, "Viewer listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Viewer stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
