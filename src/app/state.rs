//! Application state shared across routes

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::Config;
use crate::game::GameSnapshot;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Latest state published by the session after each tick
    pub session_state: watch::Receiver<GameSnapshot>,
}

impl AppState {
    pub fn new(config: Config, session_state: watch::Receiver<GameSnapshot>) -> Self {
        Self {
            config: Arc::new(config),
            session_state,
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        *self.session_state.borrow()
    }
}
