mod config;
mod db;
mod errors;
mod extract;
mod models;
mod resumes;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_support;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, run_migrations};
use crate::resumes::service::{FileStorage, ResumeService};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{InMemoryResumeStore, PgResumeStore, ResumeStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first; a bad environment aborts startup
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Resume Organizer v{}", env!("CARGO_PKG_VERSION"));

    let store = build_store(&config).await?;

    let files = FileStorage::from_config(&config);
    info!("File storage: {:?}", files);

    let state = AppState {
        service: ResumeService::new(store, files),
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Picks the resume store for this deployment. Only one backend is ever live.
async fn build_store(config: &Config) -> Result<Arc<dyn ResumeStore>> {
    match &config.storage {
        StorageBackend::Memory => {
            info!("Using in-memory resume store");
            Ok(Arc::new(InMemoryResumeStore::new()))
        }
        StorageBackend::Postgres { database_url } => {
            let pool = create_pool(database_url).await?;
            run_migrations(&pool).await?;
            info!("Using PostgreSQL resume store");
            Ok(Arc::new(PgResumeStore::new(pool)))
        }
    }
}
