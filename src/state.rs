use std::sync::Arc;

use crate::cache::DraftCache;
use crate::config::Config;
use crate::models::quiz::WindowPolicy;
use crate::store::AttemptStore;
use axum::extract::FromRef;

#[derive(Clone)]
pub struct AppState {
    pub attempts: Arc<dyn AttemptStore>,
    pub drafts: Arc<dyn DraftCache>,
    pub config: Config,
}

impl AppState {
    pub fn window_policy(&self) -> WindowPolicy {
        WindowPolicy {
            enforce_end_time: self.config.enforce_end_time,
        }
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
