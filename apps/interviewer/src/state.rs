use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::session::Session;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// The single interview session. The lock is held across a whole action.
    pub session: Arc<Mutex<Session>>,
    pub config: Config,
}

impl AppState {
    pub fn new(session: Session, config: Config) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            config,
        }
    }
}
