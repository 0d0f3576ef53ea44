//! Application state shared across routes

use std::sync::Arc;

use crate::config::Config;
use crate::game::GroundHandle;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub ground: GroundHandle,
}

impl AppState {
    pub fn new(config: Config, ground: GroundHandle) -> Self {
        Self {
            config: Arc::new(config),
            ground,
        }
    }
}
