//! Application state for the API server

use crate::{ChannelCloner, Config};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clone).
#[derive(Clone)]
pub struct AppState {
    /// The cloner that owns every job
    pub cloner: Arc<ChannelCloner>,

    /// Configuration (read-only)
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(cloner: Arc<ChannelCloner>, config: Arc<Config>) -> Self {
        Self { cloner, config }
    }
}
