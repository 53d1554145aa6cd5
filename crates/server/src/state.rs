use std::sync::Arc;
use mediaconv_core::{Config, ConversionService};

/// Shared application state
pub struct AppState {
    config: Config,
    service: Arc<ConversionService>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<ConversionService>) -> Self {
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn service(&self) -> &ConversionService {
        self.service.as_ref()
    }
}
