//! HTTP front end: one batch executor per request.
//!
//! - `POST /api/annotate` returns the corpus as JSON
//! - `POST /api/export/:format` returns the document in one output format
//! - `GET /api/health`

mod handlers;
mod routes;

pub use routes::create_router;

use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::{ServiceConfig, Settings};
use crate::context::Context;
use crate::dictionary::Dictionaries;
use crate::pool::{TokioWorkerPool, WorkerPool};

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ServiceConfig>,
    pub context: Arc<Context>,
    pub pool: Arc<dyn WorkerPool>,
}

impl AppState {
    /// Load dictionaries and start the worker pool. Must run inside a tokio runtime.
    pub fn new(settings: &Settings) -> anyhow::Result<Self> {
        let dictionaries = Dictionaries::load(&settings.dictionary_paths)?;
        if dictionaries.is_empty() {
            tracing::warn!("No dictionaries loaded; every request will fail to build a processor");
        } else {
            tracing::info!(
                "Loaded {} dictionaries and {} regex dictionaries",
                dictionaries.exact.len(),
                dictionaries.regex.len()
            );
        }

        let pool = TokioWorkerPool::new(settings.workers)?;
        tracing::info!("Worker pool running {} jobs at a time", pool.workers());

        Ok(Self {
            service: Arc::new(settings.service.clone()),
            context: Arc::new(Context::new(settings.base_configuration(), dictionaries)),
            pool: Arc::new(pool),
        })
    }
}

/// Start the web server.
pub async fn serve(settings: &Settings, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
