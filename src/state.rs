//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. The
//! store is optional: if the configured backend fails to come up the server
//! still starts, and every data route answers 503 until it is restarted
//! with working storage.

use std::sync::Arc;

use crate::config::Config;
use crate::error::ApiError;
use crate::store::DocumentStore;

/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub store: Option<Arc<dyn DocumentStore>>,
    pub config: Arc<Config>,
}

impl AppState {
    #[must_use]
    pub fn new(store: Option<Arc<dyn DocumentStore>>, config: Config) -> Self {
        Self { store, config: Arc::new(config) }
    }

    /// The configured store, or 503 if storage never initialized.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Unavailable` when no store is configured.
    pub fn store(&self) -> Result<Arc<dyn DocumentStore>, ApiError> {
        self.store
            .clone()
            .ok_or_else(|| ApiError::Unavailable("storage backend is not initialized".into()))
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================
