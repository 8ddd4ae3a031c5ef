use std::sync::Arc;

use rsvp_store::{InviteStore, StoreResult};
use tracing::error;

use crate::error::ApiError;

/// Shared handler state: a handle to the process's single store.
#[derive(Clone)]
pub struct AppState {
    store: Arc<dyn InviteStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn InviteStore>) -> Self {
        Self { store }
    }

    /// Run a store call on the blocking pool. Store calls wait on the
    /// container's write lock and must not stall the async workers.
    pub async fn run<T, F>(&self, f: F) -> Result<StoreResult<T>, ApiError>
    where
        F: FnOnce(&dyn InviteStore) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || f(store.as_ref()))
            .await
            .map_err(|err| {
                error!(error = %err, "store task failed");
                ApiError::internal()
            })
    }
}
