//! Shared application state.

use std::sync::Arc;

use verify_config::Settings;
use verify_queue::JobQueue;

#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<JobQueue>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(queue: Arc<JobQueue>, settings: Arc<Settings>) -> Self {
        Self { queue, settings }
    }
}
