//! Shared application state for the HTTP server.

use std::sync::Arc;

use casefile::io::store::FileStore;
use casefile::service::Registry;
use tokio::sync::Mutex;

/// Shared state accessible from all request handlers.
///
/// Requests are serialized through one lock; each holds it for a single
/// read or a single validated write.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<Mutex<Registry<FileStore>>>,
}

impl AppState {
    pub fn new(registry: Registry<FileStore>) -> Self {
        Self {
            registry: Arc::new(Mutex::new(registry)),
        }
    }
}
