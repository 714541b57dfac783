use std::sync::Arc;

use crate::config::Config;
use crate::jobs::DownloadService;
use crate::observability::Metrics;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: DownloadService,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(config: Config, service: DownloadService, metrics: Arc<Metrics>) -> Self {
        Self {
            config: Arc::new(config),
            service,
            metrics,
        }
    }
}
