//! Settlement ops server - citation verification for settlement analyses.
//!
//! This is the main entry point for the dashboard web server.
//! The application is organized into the following modules:
//!
//! - `models`: Case, citation, and API payload types
//! - `matcher`: Quote normalization and location in page text
//! - `citations`: Citation index and lenient path resolution
//! - `pdf` / `render`: Document decoding and page rendering with a text layer
//! - `viewer`: Viewer session state machine
//! - `cases`: Case store and document sources
//! - `audit`: Batch citation checks
//! - `templates`: HTML/CSS/JS templates
//! - `handlers`: HTTP route handlers

use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use settlement_ops::{router, AppState, Config};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("settlement_ops=info")),
        )
        .init();

    let config = Config::from_env();
    let bind = config.bind.clone();

    let state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => {
            error!("failed to initialize: {}", e);
            std::process::exit(1);
        }
    };

    info!("cases directory: {}", state.config.cases_dir.display());
    info!("text cache: {}", state.config.cache_path.display());
    if state.config.document_url.is_none() {
        info!("viewer documents served from the cases directory");
    }

    let app = router(state);

    let listener = match tokio::net::TcpListener::bind(&bind).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind to {}: {}", bind, e);
            std::process::exit(1);
        }
    };

    info!("settlement ops server running at http://{}", bind);

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {}", e);
    }
}
