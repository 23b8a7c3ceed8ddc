// Application state module
// Shared by every connection task

use super::types::Config;

/// Application state
///
/// Read-only after startup, so connection tasks share it through an `Arc`
/// without any locking.
pub struct AppState {
    pub config: Config,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }
}
