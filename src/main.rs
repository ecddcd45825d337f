mod config;
mod db;
mod error;
mod models;
mod routes;
mod services;
mod state;
mod store;

use std::sync::Arc;

use config::{Config, StorageConfig};
use store::{DocumentStore, FileStore, PgStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Loaded before the subscriber so `.env` can set `RUST_LOG`.
    let dotenv = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!(error = %e, "ignoring unreadable .env"),
    }

    let config = Config::from_env()?;
    let port = config.port;

    // Storage failure is non-fatal: data routes answer 503 until restart.
    let store = match open_store(&config.storage).await {
        Ok(store) => {
            tracing::info!(backend = store.backend(), "storage initialized");
            Some(store)
        }
        Err(e) => {
            tracing::warn!(error = %e, "storage unavailable; data routes will answer 503");
            None
        }
    };

    let state = state::AppState::new(store, config);
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "classroom listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn open_store(storage: &StorageConfig) -> Result<Arc<dyn DocumentStore>, store::StoreError> {
    match storage {
        StorageConfig::File(path) => {
            let store = FileStore::open(path.clone()).await?;
            tracing::info!(path = %store.path().display(), "using data file");
            Ok(Arc::new(store))
        }
        StorageConfig::Postgres { url, max_connections } => {
            let pool = db::init_pool(url, *max_connections).await?;
            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}
